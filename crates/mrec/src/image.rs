use std::path::Path;

use mrec_state::GuestMemory;
use tracing::debug;

use crate::error::{Error, Result};

/// Load a raw binary image into guest memory at `base`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the image would extend
/// past the end of the 32-bit address space.
pub fn load_image(path: impl AsRef<Path>, base: u32) -> Result<GuestMemory> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let size = data.len();
    let end = u64::from(base) + u64::try_from(size).unwrap_or(u64::MAX);
    if end > 1 << 32 {
        return Err(Error::ImageTooLarge { base, size });
    }
    debug!(
        path = %path.display(),
        base = format!("{base:#x}"),
        size,
        "image loaded"
    );
    Ok(GuestMemory::from_image(base, data))
}
