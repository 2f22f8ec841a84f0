use clap::{Parser, ValueEnum};
use colored::Colorize;
use comboflow_build::{DockerEngine, Pipeline, PipelineOutcome, PipelineRequest, RegistryAuth};
use comboflow_core::ImageReference;
use comboflow_merge::{CopyStrategy, MergeOptions};
use comboflow_resolver::{CachedSource, HubSource};
use std::collections::HashMap;

#[derive(Parser)]
#[command(name = "combo")]
#[command(about = "無関係なベースイメージ達を、ひとつのcomboイメージに。", long_about = None)]
#[command(version)]
struct Cli {
    /// ベースイメージ（user/repo:tag または repo:tag。@<url> でDockerfileを直接指定）
    #[arg(
        value_name = "IMAGE",
        num_args = 2..,
        required = true,
        value_parser = ImageReference::parse,
    )]
    images: Vec<ImageReference>,

    /// ビルド後にレジストリへpushする
    #[arg(long)]
    push: bool,

    /// 環境変数のオーバーライド（複数指定可）
    #[arg(long = "override-env", value_name = "NAME=VALUE")]
    override_env: Vec<String>,

    /// FROM行を差し替える（互換性チェックは省略される）
    #[arg(long = "override-from", value_name = "IMAGE")]
    override_from: Option<String>,

    /// ターゲットプラットフォーム（例: linux/amd64。複数指定可）
    #[arg(long, value_name = "PLATFORM")]
    platform: Vec<String>,

    /// タイムスタンプを見ずに必ずリビルドする
    #[arg(long)]
    force: bool,

    /// イメージ間COPYの解決戦略
    #[arg(long = "copy-strategy", value_enum, default_value_t = CopyArg::CrossImage)]
    copy_strategy: CopyArg,

    /// gnupg-curlのインストールを先頭に差し込む（apt系ベース向け）
    #[arg(long = "add-gnupg-curl")]
    add_gnupg_curl: bool,

    /// 失効したDST Root CA X3への対策を先頭に差し込む
    #[arg(long = "fix-lets-encrypt")]
    fix_lets_encrypt: bool,

    /// push時のレジストリユーザー名
    #[arg(long, env = "DOCKER_USERNAME", hide = true)]
    username: Option<String>,

    /// push時のレジストリパスワード
    #[arg(long, env = "DOCKER_PASSWORD", hide = true)]
    password: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CopyArg {
    /// 構成イメージを --from= の外部ステージとして参照する
    CrossImage,
    /// 構成イメージからファイルを取り出してコンテキストに同梱する
    Extract,
}

impl From<CopyArg> for CopyStrategy {
    fn from(arg: CopyArg) -> Self {
        match arg {
            CopyArg::CrossImage => CopyStrategy::CrossImage,
            CopyArg::Extract => CopyStrategy::Extract,
        }
    }
}

/// NAME=VALUE の列をオーバーライド表に変換
fn parse_env_overrides(pairs: &[String]) -> anyhow::Result<HashMap<String, String>> {
    let mut overrides = HashMap::new();

    for pair in pairs {
        let (name, value) = pair.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("--override-env は NAME=VALUE 形式で指定してください: {}", pair)
        })?;
        overrides.insert(name.to_string(), value.to_string());
    }

    Ok(overrides)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    let env_overrides = parse_env_overrides(&cli.override_env)?;

    // Docker接続
    println!("{}", "Dockerに接続中...".blue());
    let docker = comboflow_build::docker::init_docker().await?;

    let auth = RegistryAuth::new(cli.username.clone(), cli.password.clone());
    let engine = DockerEngine::new(docker.clone(), auth);
    let source = CachedSource::new(HubSource::new(docker));

    let request = PipelineRequest {
        constituents: cli.images.clone(),
        merge: MergeOptions {
            from_override: cli.override_from.clone(),
            env_overrides,
            copy_strategy: cli.copy_strategy.into(),
            add_gnupg_curl: cli.add_gnupg_curl,
            fix_lets_encrypt: cli.fix_lets_encrypt,
        },
        platforms: cli.platform.clone(),
        push: cli.push,
        force: cli.force,
    };

    // 失敗はここで一括して報告と終了コードに変換する
    match Pipeline::new(&source, &engine).run(&request).await {
        Ok(PipelineOutcome::UpToDate) | Ok(PipelineOutcome::Built { .. }) => Ok(()),
        Err(e) => {
            eprintln!("{}", format!("✗ {}", e).red());
            std::process::exit(1);
        }
    }
}
