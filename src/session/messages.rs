//! User-visible text.

/// Upload pressed with an empty or missing selection.
pub const NO_FILES_SELECTED: &str = "Por favor, selecciona al menos un archivo PDF.";
pub const UPLOADING: &str = "Subiendo archivos...";
pub const UPLOAD_SUCCEEDED: &str = "Archivos subidos correctamente.";
/// Followed by the server's `error` text.
pub const UPLOAD_ERROR_PREFIX: &str = "Error: ";
pub const UPLOAD_FAILED: &str = "Error al subir archivos.";

/// Followed by the server's `error` text.
pub const ANALYZE_ERROR_PREFIX: &str = "Error en el análisis: ";
pub const ANALYZE_FAILED: &str = "Error al analizar.";

pub const UPLOAD_LABEL: &str = "Subir";
pub const UPLOAD_LABEL_BUSY: &str = "Subiendo...";
pub const ANALYZE_LABEL: &str = "Analizar";
pub const ANALYZE_LABEL_BUSY: &str = "Analizando...";

// Headings
pub const TITLE: &str = "Análisis de documentos PDF";
pub const UPLOAD_HEADING: &str = "Subir archivos PDF";
pub const ANALYZE_HEADING: &str = "Analizar Documentos";
pub const RESULTS_HEADING: &str = "Resultados del Análisis";
pub const RESPONSES_HEADING: &str = "Respuestas:";
pub const EXCEL_HEADING: &str = "Archivos Excel:";
/// Followed by the spreadsheet file name.
pub const DOWNLOAD_PREFIX: &str = "Descargar ";
