//! Browser download of converted files.

use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use crate::types::{AppError, AppResult, Download};

/// Offer `download` to the user through a temporary object URL.
pub fn save_download(download: &Download) -> AppResult<()> {
    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(download.bytes.as_slice()));

    let options = BlobPropertyBag::new();
    options.set_type(&download.mime_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|e| AppError::Network(format!("Failed to create blob: {:?}", e)))?;

    let url = Url::create_object_url_with_blob(&blob)
        .map_err(|e| AppError::Network(format!("Failed to create URL: {:?}", e)))?;

    let anchor = gloo_utils::document()
        .create_element("a")
        .map_err(|e| AppError::Network(format!("Failed to create link: {:?}", e)))?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| AppError::Network("Failed to create link".to_string()))?;
    anchor.set_href(&url);
    anchor.set_download(&download.file_name);
    anchor.click();

    let _ = Url::revoke_object_url(&url);
    log::info!("💾 Downloaded {} ({} bytes)", download.file_name, download.bytes.len());
    Ok(())
}
