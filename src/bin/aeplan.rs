use std::{
    fs,
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "aeplan", version)]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the container's chunks.
    Inspect(InspectArgs),
    /// Convert a container into template JSON.
    Template(TemplateArgs),
    /// Compile a container or template JSON into a render plan.
    Compile(CompileArgs),
    /// Convert several containers in parallel.
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Conversion config JSON. Omitted fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<aeplan::ConvertConfig> {
        match &self.config {
            Some(path) => aeplan::ConvertConfig::from_path(path)
                .with_context(|| format!("load config '{}'", path.display())),
            None => Ok(aeplan::ConvertConfig::default()),
        }
    }
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Input container.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Input container.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path. Prints to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Input container or template JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Merge-field value, `name=value`. Repeatable; overrides `--merge-file`.
    #[arg(long = "merge", value_parser = parse_merge)]
    merge: Vec<(String, String)>,

    /// JSON object of merge-field values.
    #[arg(long)]
    merge_file: Option<PathBuf>,

    /// Fail on unresolved merge fields.
    #[arg(long)]
    strict: bool,

    /// Print a compact clip listing instead of JSON.
    #[arg(long)]
    dump: bool,

    /// Output path. Prints to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Directory receiving one `<stem>.json` per input.
    #[arg(long)]
    out_dir: PathBuf,

    /// Input containers.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Template(args) => cmd_template(args),
        Command::Compile(args) => cmd_compile(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn init_logging(level: &str, json: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

fn parse_merge(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty merge field name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read input '{}'", path.display()))
}

fn emit(out: Option<&Path>, body: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            fs::write(path, body).with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            if !body.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn report_warnings(warnings: &[aeplan::Warning]) {
    for w in warnings {
        eprintln!("warning: {w}");
    }
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let cfg = args.config.load()?;
    let buf = read_input(&args.in_path)?;
    let inspection = aeplan::Pipeline::new(&cfg)
        .inspect(&buf)
        .with_context(|| format!("inspect '{}'", args.in_path.display()))?;
    let body = if args.json {
        serde_json::to_string_pretty(&inspection).context("serialize inspection")?
    } else {
        inspection.to_table()
    };
    emit(None, &body)
}

fn cmd_template(args: TemplateArgs) -> anyhow::Result<()> {
    let cfg = args.config.load()?;
    let buf = read_input(&args.in_path)?;
    let template = aeplan::convert(&buf, &cfg)
        .with_context(|| format!("convert '{}'", args.in_path.display()))?;
    report_warnings(&template.metadata.warnings);
    emit(args.out.as_deref(), &template.to_json_string()?)
}

fn looks_like_json(buf: &[u8]) -> bool {
    buf.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'{')
}

fn load_merge_fields(args: &CompileArgs) -> anyhow::Result<aeplan::MergeFieldMap> {
    let mut fields = match &args.merge_file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read merge file '{}'", path.display()))?;
            serde_json::from_str::<aeplan::MergeFieldMap>(&text)
                .with_context(|| format!("parse merge file '{}'", path.display()))?
        }
        None => aeplan::MergeFieldMap::new(),
    };
    fields.extend(args.merge.iter().cloned());
    Ok(fields)
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let mut cfg = args.config.load()?;
    if args.strict {
        cfg.resolver = aeplan::ResolverMode::Strict;
    }
    let runtime = load_merge_fields(&args)?;
    let buf = read_input(&args.in_path)?;

    let mut pipeline = aeplan::Pipeline::new(&cfg);
    let plan = if looks_like_json(&buf) {
        let template = aeplan::Template::from_reader(buf.as_slice())
            .with_context(|| format!("parse template '{}'", args.in_path.display()))?;
        pipeline.compile_template(&template, &runtime)
    } else {
        pipeline.compile(&buf, &runtime)
    }
    .with_context(|| format!("compile '{}'", args.in_path.display()))?;

    report_warnings(&plan.warnings);
    let body = if args.dump {
        plan.dump()
    } else {
        plan.to_json_string()?
    };
    emit(args.out.as_deref(), &body)
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let cfg = args.config.load()?;
    let buffers = args
        .inputs
        .iter()
        .map(|p| read_input(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let results = aeplan::convert_batch(&buffers, &cfg);
    let mut failed = 0usize;
    for (path, res) in args.inputs.iter().zip(results) {
        match res {
            Ok(template) => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "template".to_string());
                let out = args.out_dir.join(format!("{stem}.json"));
                emit(Some(&out), &template.to_json_string()?)?;
            }
            Err(err) => {
                failed += 1;
                eprintln!("error: {}: {err}", path.display());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} inputs failed", args.inputs.len());
    }
    Ok(())
}
