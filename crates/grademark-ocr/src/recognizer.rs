//! Tesseract recognizer driven through the `tesseract` command line.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use image::{GrayImage, ImageFormat};
use tokio::process::Command;

use grademark_core::config::OcrConfig;
use grademark_core::error::RecognitionEngineError;
use grademark_core::traits::TextRecognizer;

/// stderr fragments tesseract prints when its language data or init fails.
const MISCONFIGURATION_MARKERS: &[&str] = &[
    "Failed loading language",
    "Could not initialize tesseract",
    "Error opening data file",
];

/// Runs one `tesseract` process per region.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    config: OcrConfig,
}

impl TesseractRecognizer {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Arguments after the program name for recognizing `image_path`.
    fn command_args(&self, image_path: &Path) -> Vec<OsString> {
        vec![
            image_path.as_os_str().to_os_string(),
            "stdout".into(),
            "--oem".into(),
            self.config.engine_mode.to_string().into(),
            "--psm".into(),
            self.config.page_segmentation_mode.to_string().into(),
            "-l".into(),
            self.config.languages.clone().into(),
        ]
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, region: &GrayImage) -> Result<String, RecognitionEngineError> {
        let file = tempfile::Builder::new()
            .prefix("grademark-region-")
            .suffix(".png")
            .tempfile()?;
        region
            .save_with_format(file.path(), ImageFormat::Png)
            .map_err(std::io::Error::other)?;

        let output = Command::new(&self.config.tesseract_cmd)
            .args(self.command_args(file.path()))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                return Err(RecognitionEngineError::Unavailable(format!(
                    "{}: {e}",
                    self.config.tesseract_cmd
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if MISCONFIGURATION_MARKERS.iter().any(|m| stderr.contains(m)) {
                return Err(RecognitionEngineError::Misconfigured(
                    stderr.trim().to_string(),
                ));
            }
            tracing::warn!(
                status = %output.status,
                stderr = %stderr.trim(),
                "tesseract failed on region, treating it as blank"
            );
            return Ok(String::new());
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!(chars = text.len(), "region recognized");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn region() -> GrayImage {
        GrayImage::from_pixel(12, 6, Luma([255]))
    }

    fn recognizer_with(cmd: &str) -> TesseractRecognizer {
        TesseractRecognizer::new(OcrConfig {
            tesseract_cmd: cmd.to_string(),
            ..OcrConfig::default()
        })
    }

    #[test]
    fn command_line_carries_modes_and_languages() {
        let args = TesseractRecognizer::new(OcrConfig::default())
            .command_args(Path::new("/tmp/region.png"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            ["/tmp/region.png", "stdout", "--oem", "3", "--psm", "6", "-l", "eng+hin+guj"]
        );
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let err = recognizer_with("/nonexistent/grademark/tesseract")
            .recognize(&region())
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionEngineError::Unavailable(_)));
        assert!(err.is_permanent());
    }

    #[cfg(unix)]
    mod fake_engine {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Writes an executable shell script standing in for tesseract.
        fn script(dir: &Path, body: &str) -> String {
            let path = dir.join("fake-tesseract");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().into_owned()
        }

        #[tokio::test]
        async fn output_is_trimmed() {
            let dir = tempfile::tempdir().unwrap();
            let cmd = script(dir.path(), "printf '  Mitochondria produce energy \\n\\n'");
            let text = recognizer_with(&cmd).recognize(&region()).await.unwrap();
            assert_eq!(text, "Mitochondria produce energy");
        }

        #[tokio::test]
        async fn missing_language_data_is_misconfigured() {
            let dir = tempfile::tempdir().unwrap();
            let cmd = script(
                dir.path(),
                "echo \"Failed loading language 'guj'\" >&2\nexit 1",
            );
            let err = recognizer_with(&cmd).recognize(&region()).await.unwrap_err();
            assert!(matches!(err, RecognitionEngineError::Misconfigured(_)));
        }

        #[tokio::test]
        async fn other_failures_read_as_blank() {
            let dir = tempfile::tempdir().unwrap();
            let cmd = script(dir.path(), "echo 'Empty page!!' >&2\nexit 1");
            let text = recognizer_with(&cmd).recognize(&region()).await.unwrap();
            assert_eq!(text, "");
        }

        #[tokio::test]
        async fn region_image_is_passed_as_first_argument() {
            let dir = tempfile::tempdir().unwrap();
            let cmd = script(dir.path(), "test -s \"$1\" && echo present || echo missing");
            let text = recognizer_with(&cmd).recognize(&region()).await.unwrap();
            assert_eq!(text, "present");
        }
    }
}
