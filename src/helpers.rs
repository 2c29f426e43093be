use super::*;

pub(super) fn load_config(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config_file: ConfigFile = toml::from_str(&contents).context("parse config")?;
    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    config_from_file(config_file, config_dir)
}

pub(super) fn config_from_file(config_file: ConfigFile, config_dir: &Path) -> Result<Config> {
    let token = config_file.token.trim().to_string();
    if token.is_empty() {
        return Err(anyhow!("token is empty"));
    }
    let delay = config_file
        .coalesce_delay_ms
        .unwrap_or(DEFAULT_COALESCE_DELAY_MS);
    let timeout = config_file
        .store_timeout_seconds
        .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS);
    if timeout == 0 {
        return Err(anyhow!("store_timeout_seconds must be positive"));
    }
    Ok(Config {
        token,
        data_dir: resolve_config_path(&config_file.data_dir, config_dir),
        coalesce_delay_ms: delay,
        store_timeout_seconds: timeout,
    })
}

pub(super) fn resolve_config_path(path: &Path, config_dir: &Path) -> PathBuf {
    if path.is_relative() {
        config_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

pub(super) fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(data).context("write temp file")?;
    tmp.flush().context("flush temp file")?;
    tmp.as_file_mut().sync_all().context("sync temp file")?;
    tmp.persist(path)
        .map_err(|e| anyhow!("persist temp file: {}", e))?;
    Ok(())
}

pub(super) fn normalize_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

pub(super) fn parse_command(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    let cmd = first.trim_start_matches('/');
    Some(cmd.split('@').next().unwrap_or(cmd))
}

pub(super) fn parse_callback_data(data: &str) -> Option<(ListId, &str)> {
    let (list, token) = data.split_once(':')?;
    let list_id = ListId::parse(list)?;
    if token.is_empty() {
        return None;
    }
    Some((list_id, token))
}
