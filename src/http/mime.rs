//! MIME type detection module
//!
//! Returns the Content-Type for the artifact kinds this server delivers.

/// Get MIME Content-Type based on file extension
///
/// # Examples
/// ```
/// use dfci_test_server::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("efi")), "application/efi");
/// assert_eq!(get_content_type(Some("json")), "application/json");
/// assert_eq!(get_content_type(None), "application/octet-stream");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // UEFI boot images
        Some("efi") => "application/efi",

        // Packet and status documents
        Some("json") => "application/json",
        Some("xml") => "application/xml",

        // Text
        Some("txt") => "text/plain; charset=utf-8",
        Some("html" | "htm") => "text/html; charset=utf-8",

        // Default, also covers the .bin packet files
        _ => "application/octet-stream",
    }
}
