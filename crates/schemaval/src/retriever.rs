//! The default loader for external schema documents.
use referencing::{Retrieve, Uri};
use serde_json::Value;

/// Fetches `http(s)` documents through `reqwest` and `file` documents from
/// the local filesystem, each behind its own crate feature. Other schemes
/// are rejected with a descriptive message.
#[derive(Debug, Default)]
pub struct DefaultRetriever;

impl Retrieve for DefaultRetriever {
    fn retrieve(&self, uri: &Uri<String>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        match uri.scheme().as_str() {
            "http" | "https" => {
                #[cfg(feature = "resolve-http")]
                {
                    Ok(reqwest::blocking::get(uri.as_str())?.error_for_status()?.json()?)
                }
                #[cfg(not(feature = "resolve-http"))]
                {
                    Err("HTTP retrieval is disabled (the 'resolve-http' feature is off)".into())
                }
            }
            "file" => {
                #[cfg(feature = "resolve-file")]
                {
                    let path = percent_encoding::percent_decode_str(uri.path().as_str())
                        .decode_utf8()
                        .map_err(|error| format!("Invalid file path encoding: {error}"))?;
                    let file = std::fs::File::open(path.as_ref())?;
                    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
                }
                #[cfg(not(feature = "resolve-file"))]
                {
                    Err("File retrieval is disabled (the 'resolve-file' feature is off)".into())
                }
            }
            scheme => Err(format!("Cannot retrieve '{}': unsupported scheme '{scheme}'", uri.as_str()).into()),
        }
    }
}
