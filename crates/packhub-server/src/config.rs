use std::path::Path;

use packhub_types::ServerInfo;
use tracing::warn;

/// Node identity served on `/api/info`. Seeded from `PACKHUB_SERVER_NAME` /
/// `PACKHUB_SERVER_DESC`, but a `config.json` in the data dir wins once it
/// exists; the file is created from the env/defaults on first start.
pub fn load_server_info(data_dir: &Path) -> anyhow::Result<ServerInfo> {
    let mut info = ServerInfo {
        name: std::env::var("PACKHUB_SERVER_NAME").unwrap_or_else(|_| "Packhub".into()),
        description: std::env::var("PACKHUB_SERVER_DESC").unwrap_or_default(),
    };

    let path = data_dir.join("config.json");
    if path.exists() {
        let data = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<ServerInfo>(&data) {
            Ok(saved) => {
                if !saved.name.is_empty() {
                    info.name = saved.name;
                }
                info.description = saved.description;
            }
            Err(e) => warn!("Ignoring unparseable {}: {}", path.display(), e),
        }
    } else {
        std::fs::write(&path, serde_json::to_string_pretty(&info)?)?;
    }

    Ok(info)
}
