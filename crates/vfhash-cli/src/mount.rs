//! `--mount PREFIX=DIR` handling and mount table assembly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use vfhash_device::MountTable;

/// Parse one `PREFIX=DIR` argument
pub fn parse_mount(arg: &str) -> Result<(String, PathBuf), String> {
    let (prefix, dir) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected PREFIX=DIR, got {:?}", arg))?;
    if prefix.is_empty() {
        return Err("mount prefix is empty".to_string());
    }
    if dir.is_empty() {
        return Err(format!("no directory given for {}", prefix));
    }
    Ok((prefix.to_string(), PathBuf::from(dir)))
}

/// Config mounts overlaid with command-line mounts
pub fn merge_mounts(
    configured: &BTreeMap<String, PathBuf>,
    cli: &[(String, PathBuf)],
) -> BTreeMap<String, PathBuf> {
    let mut mounts = configured.clone();
    mounts.extend(cli.iter().cloned());
    mounts
}

pub fn build_table(mounts: &BTreeMap<String, PathBuf>) -> Result<MountTable> {
    for (prefix, dir) in mounts {
        let dir = dir.display().to_string();
        vfhash_config::log_cli_debug!("Mount", prefix = prefix.as_str(), dir = dir.as_str());
    }
    MountTable::from_dirs(mounts.clone()).context("Failed to mount volumes")
}

/// Host directory mounted at exactly `prefix`
pub fn host_dir<'a>(mounts: &'a BTreeMap<String, PathBuf>, prefix: &str) -> Result<&'a Path> {
    match mounts.get(prefix) {
        Some(dir) => Ok(dir.as_path()),
        None => bail!("Nothing is mounted at {}", prefix),
    }
}

/// Virtual path of a host file below a mount's directory
pub fn virtual_path(prefix: &str, root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(format!("{}{}", prefix, parts.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mount() {
        let (prefix, dir) = parse_mount("platform:/=/srv/x=y").unwrap();
        assert_eq!(prefix, "platform:/");
        assert_eq!(dir, PathBuf::from("/srv/x=y"));

        assert!(parse_mount("platform:/").is_err());
        assert!(parse_mount("=/srv").is_err());
        assert!(parse_mount("audio:/=").is_err());
    }

    #[test]
    fn test_cli_mounts_override_config() {
        let mut configured = BTreeMap::new();
        configured.insert("common:/".to_string(), PathBuf::from("/cfg/common"));
        configured.insert("audio:/".to_string(), PathBuf::from("/cfg/audio"));

        let merged = merge_mounts(
            &configured,
            &[("common:/".to_string(), PathBuf::from("/cli/common"))],
        );
        assert_eq!(merged["common:/"], PathBuf::from("/cli/common"));
        assert_eq!(merged["audio:/"], PathBuf::from("/cfg/audio"));
    }

    #[test]
    fn test_virtual_path() {
        let root = Path::new("/srv/platform");
        assert_eq!(
            virtual_path("platform:/", root, Path::new("/srv/platform/data/a.rpf")).as_deref(),
            Some("platform:/data/a.rpf")
        );
        assert!(virtual_path("platform:/", root, Path::new("/elsewhere/a")).is_none());
    }

    #[test]
    fn test_host_dir_unmounted() {
        let mounts = BTreeMap::new();
        assert!(host_dir(&mounts, "update:/").is_err());
    }
}
