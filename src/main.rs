//! Purpose: `oncoapi` CLI entry point: scaled-coordinate codec and custom-metric queries.
//! Role: Binary crate root; parses args, runs one command, emits JSON on stdout.
//! Invariants: Command output is compact JSON, one document or one line per result.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use oncoapi::api::{
    Error, ErrorKind, MetricQuery, Point3D, PropertyBag, RemoteClient, decode_points,
    decode_scalar, encode_points, encode_scalar, extract_boolean, extract_string, to_exit_code,
};

const BASE_URL_ENV: &str = "ONCOAPI_BASE_URL";
const TOKEN_ENV: &str = "ONCOAPI_TOKEN";

#[derive(Parser)]
#[command(
    name = "oncoapi",
    version,
    about = "Client for the oncology-informatics web API",
    long_about = None,
    after_help = r#"EXAMPLES
  $ oncoapi encode '[[12.345, 23.456, 34.567]]'
  [[12345,23456,34567]]
  $ oncoapi decode 12345
  12.345
  $ oncoapi metric MeanDose --patient P-001 --param structure=PTV --field value

ENVIRONMENT
  ONCOAPI_BASE_URL   default for --base-url
  ONCOAPI_TOKEN      default for --token
  RUST_LOG           log filter for stderr diagnostics (default: warn)"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, global = true, help = "API base URL (http or https)")]
    base_url: Option<String>,
    #[arg(long, global = true, help = "Bearer token sent with every request")]
    token: Option<String>,
    #[arg(
        long,
        global = true,
        help = "PEM bundle of trusted CA certificates",
        value_hint = ValueHint::FilePath
    )]
    tls_ca: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        conflicts_with = "tls_ca",
        help = "Disable TLS certificate verification (cannot be combined with --tls-ca)"
    )]
    tls_skip_verify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Encode millimeters (number or [[x, y, z], ...]) to the wire form")]
    Encode {
        #[arg(help = "JSON input; reads stdin when omitted or '-'")]
        input: Option<String>,
    },
    #[command(about = "Decode a wire integer or wire point list to millimeters")]
    Decode {
        #[arg(help = "JSON input; reads stdin when omitted or '-'")]
        input: Option<String>,
    },
    #[command(about = "Run a custom-metric query and print each result as a JSON line")]
    Metric(MetricArgs),
}

#[derive(Args)]
struct MetricArgs {
    #[arg(help = "Metric name")]
    name: String,
    #[arg(long, help = "Patient identifier")]
    patient: Option<String>,
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    params: Vec<(String, String)>,
    #[arg(long = "field", value_name = "KEY", help = "Print only these fields, as text")]
    fields: Vec<String>,
    #[arg(
        long = "only-flag",
        value_name = "KEY",
        help = "Keep only results whose boolean KEY is true"
    )]
    only_flag: Option<String>,
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let code = if err.kind() == ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                {
                    2
                } else {
                    0
                };
                return Ok(code);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `oncoapi --help` for usage."));
            }
        },
    };

    match &cli.command {
        Command::Encode { input } => {
            let value = read_input(input.as_deref())?;
            print_json(&encode_value(&value)?)?;
        }
        Command::Decode { input } => {
            let value = read_input(input.as_deref())?;
            print_json(&decode_value(&value)?)?;
        }
        Command::Metric(args) => {
            let client = build_client(&cli)?;
            run_metric(&client, args)?;
        }
    }
    Ok(0)
}

fn build_client(cli: &Cli) -> Result<RemoteClient, Error> {
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| std::env::var(BASE_URL_ENV).ok())
        .ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("missing API base url")
                .with_hint(format!("Pass --base-url or set {BASE_URL_ENV}."))
        })?;
    let mut client = RemoteClient::new(base_url)?;
    if let Some(token) = cli.token.clone().or_else(|| std::env::var(TOKEN_ENV).ok()) {
        client = client.with_token(token);
    }
    if let Some(path) = &cli.tls_ca {
        client = client.with_tls_ca_file(path)?;
    }
    if cli.tls_skip_verify {
        client = client.with_tls_skip_verify();
    }
    Ok(client)
}

fn run_metric(client: &RemoteClient, args: &MetricArgs) -> Result<(), Error> {
    let mut query = MetricQuery::new(args.name.clone());
    if let Some(patient) = &args.patient {
        query = query.with_patient(patient.clone());
    }
    for (key, value) in &args.params {
        query = query.with_parameter(key.clone(), value.clone());
    }

    for row in client.query_custom_metric(&query)? {
        if let Some(flag) = &args.only_flag {
            if !extract_boolean(&row, flag, false)? {
                continue;
            }
        }
        if args.fields.is_empty() {
            print_json(&Value::Object(row))?;
        } else {
            print_json(&select_fields(&row, &args.fields))?;
        }
    }
    Ok(())
}

fn select_fields(row: &PropertyBag, fields: &[String]) -> Value {
    let mut out = Map::new();
    for field in fields {
        let text = extract_string(row, field).map_or(Value::Null, Value::String);
        out.insert(field.clone(), text);
    }
    Value::Object(out)
}

fn encode_value(value: &Value) -> Result<Value, Error> {
    match value {
        Value::Number(number) => {
            let mm = number.as_f64().ok_or_else(|| usage("input number is out of range"))?;
            Ok(json!(encode_scalar(mm)))
        }
        Value::Array(items) => {
            let mut points = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                points.push(decimal_point(item).map_err(|err| err.with_index(index))?);
            }
            Ok(json!(encode_points(&points)))
        }
        _ => Err(usage("encode input must be a number or an array of [x, y, z] points")),
    }
}

fn decimal_point(value: &Value) -> Result<Point3D, Error> {
    let coords = value
        .as_array()
        .filter(|coords| coords.len() == 3)
        .ok_or_else(|| usage("each point must be an array of 3 numbers"))?;
    let mut out = [0.0; 3];
    for (slot, coord) in out.iter_mut().zip(coords) {
        *slot = coord
            .as_f64()
            .ok_or_else(|| usage("each point must be an array of 3 numbers"))?;
    }
    Ok(Point3D::from(out))
}

fn decode_value(value: &Value) -> Result<Value, Error> {
    match value {
        Value::Number(number) => {
            let wire = number.as_i64().ok_or_else(|| {
                Error::new(ErrorKind::MalformedEncoding)
                    .with_message("wire coordinate must be an integer")
            })?;
            Ok(json!(decode_scalar(wire)))
        }
        Value::Array(items) => {
            let points = decode_points(items)?;
            Ok(Value::Array(
                points.into_iter().map(|point| json!(point.to_array())).collect(),
            ))
        }
        _ => Err(usage(
            "decode input must be an integer or an array of [x, y, z] integer points",
        )),
    }
}

fn read_input(input: Option<&str>) -> Result<Value, Error> {
    let text = match input {
        Some(text) if text != "-" => text.to_string(),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            buf
        }
    };
    oncoapi::json::parse::from_str(&text)
        .map_err(|err| oncoapi::json::parse::decode_error(err, "command input"))
}

fn print_json(value: &Value) -> Result<(), Error> {
    let text = serde_json::to_string(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output json")
            .with_source(err)
    })?;
    println!("{text}");
    Ok(())
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn usage(message: &str) -> Error {
    Error::new(ErrorKind::Usage).with_message(message)
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .next()
        .unwrap_or("invalid arguments")
        .trim_start_matches("error: ")
        .to_string()
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }
    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Decode => "invalid json".to_string(),
        ErrorKind::MalformedEncoding => "malformed scaled encoding".to_string(),
        ErrorKind::TypeMismatch => "property type mismatch".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(key) = err.key() {
        inner.insert("key".to_string(), json!(key));
    }
    if let Some(index) = err.index() {
        inner.insert("index".to_string(), json!(index));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(key) = err.key() {
        lines.push(format!("key: {key}"));
    }
    if let Some(index) = err.index() {
        lines.push(format!("index: {index}"));
    }
    for cause in error_causes(err) {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}
