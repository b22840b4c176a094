use crate::db::Store;
use crate::error::Result;
use crate::settings::{load_settings, resolve_db_path, save_settings, settings_path, shellexpand_path};

pub fn run(db: Option<&str>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(path) = db {
        settings.db_path = shellexpand_path(path);
    }
    save_settings(&settings)?;

    let db_path = resolve_db_path(&settings, None);
    Store::open(&db_path)?.close()?;

    println!("Settings:  {}", settings_path().display());
    println!("Database:  {}", db_path.display());
    Ok(())
}
