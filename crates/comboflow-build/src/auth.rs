//! レジストリ認証処理
//!
//! push時の認証情報は環境変数（`DOCKER_USERNAME` / `DOCKER_PASSWORD`）で
//! 渡された組を最優先し、なければ `~/.docker/config.json` の auths を
//! 参照します。

use base64::Engine;
use bollard::auth::DockerCredentials;
use std::path::PathBuf;

/// push時に使うレジストリ認証
#[derive(Debug, Default)]
pub struct RegistryAuth {
    username: Option<String>,
    password: Option<String>,
}

impl RegistryAuth {
    /// 外部から注入された認証主体と秘密で作成
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// push先リポジトリに対する認証情報を返す
    ///
    /// 見つからない場合は `None`（未認証でpushを試みる）。
    pub fn credentials(&self, repository: &str) -> Option<DockerCredentials> {
        let registry = extract_registry(repository);

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Some(DockerCredentials {
                username: Some(username.clone()),
                password: Some(password.clone()),
                serveraddress: Some(registry),
                ..Default::default()
            });
        }

        config_credentials(&registry)
    }
}

/// リポジトリ名からレジストリを抽出
///
/// 先頭のパスセグメントが `.` か `:` を含む場合だけレジストリとみなす。
/// それ以外はDocker Hub。
fn extract_registry(repository: &str) -> String {
    if let Some((first, _)) = repository.split_once('/')
        && (first.contains('.') || first.contains(':'))
    {
        return first.to_string();
    }

    "docker.io".to_string()
}

/// Docker config.json の auths からレジストリの認証情報を取得
fn config_credentials(registry: &str) -> Option<DockerCredentials> {
    let content = std::fs::read_to_string(docker_config_path()?).ok()?;
    let config: serde_json::Value = serde_json::from_str(&content).ok()?;

    let auth_b64 = config.get("auths")?.get(registry)?.get("auth")?.as_str()?;

    // Base64デコード (username:password 形式)
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(auth_b64)
        .ok()?;
    let auth_str = String::from_utf8(decoded).ok()?;
    let (username, password) = auth_str.split_once(':')?;

    Some(DockerCredentials {
        username: Some(username.to_string()),
        password: Some(password.to_string()),
        serveraddress: Some(registry.to_string()),
        ..Default::default()
    })
}

fn docker_config_path() -> Option<PathBuf> {
    match std::env::var("DOCKER_CONFIG") {
        Ok(dir) => Some(PathBuf::from(dir).join("config.json")),
        Err(_) => dirs::home_dir().map(|home| home.join(".docker").join("config.json")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_registry_docker_hub() {
        assert_eq!(extract_registry("combos/python_node"), "docker.io");
        assert_eq!(extract_registry("nginx"), "docker.io");
    }

    #[test]
    fn test_extract_registry_explicit() {
        assert_eq!(extract_registry("ghcr.io/org/app"), "ghcr.io");
        assert_eq!(extract_registry("localhost:5000/app"), "localhost:5000");
    }

    #[test]
    fn test_injected_credentials_take_priority() {
        let auth = RegistryAuth::new(Some("user".to_string()), Some("secret".to_string()));
        let creds = auth.credentials("combos/python_node").unwrap();

        assert_eq!(creds.username.as_deref(), Some("user"));
        assert_eq!(creds.password.as_deref(), Some("secret"));
        assert_eq!(creds.serveraddress.as_deref(), Some("docker.io"));
    }

    #[test]
    fn test_config_credentials_from_file() {
        let dir = tempfile::tempdir().unwrap();
        // auth = base64("user:pass")
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"auths": {"docker.io": {"auth": "dXNlcjpwYXNz"}}}"#,
        )
        .unwrap();

        temp_env::with_var("DOCKER_CONFIG", Some(dir.path()), || {
            let auth = RegistryAuth::default();
            let creds = auth.credentials("combos/python_node").unwrap();
            assert_eq!(creds.username.as_deref(), Some("user"));
            assert_eq!(creds.password.as_deref(), Some("pass"));
        });
    }

    #[test]
    fn test_missing_credentials() {
        temp_env::with_var("DOCKER_CONFIG", Some("/nonexistent"), || {
            let auth = RegistryAuth::default();
            assert!(auth.credentials("combos/python_node").is_none());
        });
    }
}
