use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::Duration;
use tracing::{debug, info, trace};

use crate::store::InsertOrder;

#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_files: Vec<PathBuf>,
}

impl Config {
    #[tracing::instrument(skip(override_path))]
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Config {
            map: HashMap::new(),
            loaded_files: vec![],
        };

        cfg.map
            .insert("order.insert".to_string(), "oldest-first".to_string());
        cfg.map
            .insert("form.delay.ms".to_string(), "500".to_string());
        cfg.map.insert("color".to_string(), "on".to_string());

        let rc = resolve_rc_path(override_path)?;
        if let Some(path) = rc {
            info!(rc = %path.display(), "loading taskflowrc");
            cfg.load_file(&path)?;
        } else {
            debug!("no taskflowrc found; using defaults");
        }

        Ok(cfg)
    }

    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k).to_string();
            debug!(key = %key, value = %v, "applying override");
            self.map.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).map(|v| parse_bool(v))
    }

    pub fn insert_order(&self) -> anyhow::Result<InsertOrder> {
        match self.get("order.insert") {
            None => Ok(InsertOrder::OldestFirst),
            Some(value) => value.parse(),
        }
    }

    pub fn form_delay(&self) -> anyhow::Result<Duration> {
        let raw = self
            .get("form.delay.ms")
            .unwrap_or_else(|| "500".to_string());
        let ms: i64 = raw
            .trim()
            .parse()
            .with_context(|| format!("invalid form.delay.ms: {raw}"))?;
        if ms < 0 {
            return Err(anyhow!("form.delay.ms must not be negative: {ms}"));
        }
        Ok(Duration::milliseconds(ms))
    }

    #[tracing::instrument(skip(self))]
    fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let path = expand_tilde(path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        self.loaded_files.push(path.clone());

        for (line_num, raw_line) in text.lines().enumerate() {
            let mut line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((before, _)) = line.split_once('#') {
                line = before.trim();
            }
            if line.is_empty() {
                continue;
            }

            let (k, v) = line.split_once('=').ok_or_else(|| {
                anyhow!(
                    "invalid config line {}:{}: {}",
                    path.display(),
                    line_num + 1,
                    raw_line
                )
            })?;

            let key = k.trim().to_string();
            let value = v.trim().to_string();
            trace!(key = %key, value = %value, "loaded config key");
            self.map.insert(key, value);
        }

        Ok(())
    }
}

#[tracing::instrument(skip(override_path))]
fn resolve_rc_path(override_path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = override_path {
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(rc_env) = std::env::var("TASKFLOWRC") {
        if rc_env == "/dev/null" {
            return Ok(None);
        }
        return Ok(Some(PathBuf::from(rc_env)));
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    let candidate = home.join(".taskflowrc");
    if candidate.exists() {
        return Ok(Some(candidate));
    }

    Ok(None)
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "on" | "true"
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::Duration;
    use tempfile::NamedTempFile;

    use super::Config;
    use crate::store::InsertOrder;

    fn config_from(text: &str) -> Config {
        let mut file = NamedTempFile::new().expect("temp rc file");
        write!(file, "{text}").expect("write rc file");
        Config::load(Some(file.path())).expect("load config")
    }

    #[test]
    fn defaults_apply_without_any_file_entries() {
        let cfg = config_from("");
        assert_eq!(cfg.insert_order().expect("order"), InsertOrder::OldestFirst);
        assert_eq!(
            cfg.form_delay().expect("delay"),
            Duration::milliseconds(500)
        );
        assert_eq!(cfg.get_bool("color"), Some(true));
    }

    #[test]
    fn file_entries_and_comments_are_parsed() {
        let cfg = config_from(
            "# session settings\n\
             order.insert = newest-first\n\
             form.delay.ms = 0   # instant submissions\n\
             \n\
             color = off\n",
        );

        assert_eq!(cfg.insert_order().expect("order"), InsertOrder::NewestFirst);
        assert_eq!(cfg.form_delay().expect("delay"), Duration::zero());
        assert_eq!(cfg.get_bool("color"), Some(false));
        assert_eq!(cfg.loaded_files.len(), 1);
    }

    #[test]
    fn overrides_win_and_rc_prefix_is_stripped() {
        let mut cfg = config_from("order.insert = newest-first\n");
        cfg.apply_overrides(vec![(
            "rc.order.insert".to_string(),
            "oldest-first".to_string(),
        )]);

        assert_eq!(cfg.insert_order().expect("order"), InsertOrder::OldestFirst);
    }

    #[test]
    fn bad_values_are_reported() {
        let cfg = config_from("order.insert = sideways\n");
        assert!(cfg.insert_order().is_err());

        let cfg = config_from("form.delay.ms = soon\n");
        assert!(cfg.form_delay().is_err());

        let cfg = config_from("form.delay.ms = -5\n");
        assert!(cfg.form_delay().is_err());
    }

    #[test]
    fn lines_without_an_equals_sign_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp rc file");
        std::io::Write::write_all(&mut file, b"order.insert newest-first\n").expect("write");
        assert!(Config::load(Some(file.path())).is_err());
    }
}
