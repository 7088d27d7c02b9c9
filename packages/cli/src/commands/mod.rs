pub mod generate;
pub mod init;
pub mod judge;
pub mod preview;
pub mod sectors;

use std::path::Path;

use anyhow::Result;
use taskgen::Session;

use crate::manifest::{LoadedManifest, TaskManifest};

pub(crate) async fn load_session(path: &Path) -> Result<(LoadedManifest, Session)> {
    let loaded = TaskManifest::load(path)?;
    let session = loaded.to_session().await?;
    Ok((loaded, session))
}
