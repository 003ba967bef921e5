//! Google Drive links for embedded lecture videos.

use url::Url;

const DRIVE_DOWNLOAD: &str = "https://drive.google.com/uc";

/// Drive file id from an embed URL such as
/// `https://drive.google.com/file/d/<id>/preview`: the second-to-last path
/// segment.
pub fn file_id_from_embed(src: &str) -> Option<String> {
    let url = Url::parse(src.trim()).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();
    let id = segments.len().checked_sub(2).map(|i| segments[i])?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Direct download URL for a Drive file.
pub fn download_url(file_id: &str) -> String {
    format!("{DRIVE_DOWNLOAD}?id={file_id}&export=download")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_from_preview_embed() {
        assert_eq!(
            file_id_from_embed("https://drive.google.com/file/d/1AbC-xyz_09/preview").as_deref(),
            Some("1AbC-xyz_09")
        );
        assert_eq!(
            file_id_from_embed("https://drive.google.com/file/d/1AbC/preview?usp=sharing#t=3")
                .as_deref(),
            Some("1AbC")
        );
    }

    #[test]
    fn test_file_id_rejects_short_urls() {
        assert_eq!(file_id_from_embed("preview"), None);
        assert_eq!(file_id_from_embed("https://drive.google.com/preview"), None);
        assert_eq!(file_id_from_embed("https://drive.google.com//preview"), None);
        assert_eq!(file_id_from_embed(""), None);
    }

    #[test]
    fn test_download_url() {
        assert_eq!(
            download_url("1AbC"),
            "https://drive.google.com/uc?id=1AbC&export=download"
        );
    }
}
