//! Standard APIs we use everywhere.

pub use std::path::{Path, PathBuf};

pub use crate::error::{OcrError, Result};
#[allow(unused_imports)]
pub use tracing::{debug, error, info, instrument, trace, warn};
