use {
    anyhow::{bail, Context, Result},
    argh::FromArgs,
    pix_brcode::{
        parse_payload, Amount, Encoder, Leniency, MerchantSettings, PixFields, PixKeyKind,
        PointOfInitiation,
    },
    serde::Serialize,
    std::{
        collections::BTreeMap,
        fs,
        io::{self, Read},
        path::PathBuf,
    },
    tracing::info,
    tracing_subscriber::{fmt, prelude::*, EnvFilter},
};

#[derive(FromArgs)]
/// Encode, decode and validate PIX BR Code payloads.
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Encode(EncodeArgs),
    Decode(DecodeArgs),
    Validate(ValidateArgs),
}

#[derive(FromArgs)]
/// Build a payload from merchant settings and payment fields.
#[argh(subcommand, name = "encode")]
struct EncodeArgs {
    /// JSON file with pix_key, merchant_name and merchant_city
    #[argh(option)]
    settings: Option<PathBuf>,

    /// PIX key, overrides the settings file
    #[argh(option)]
    pix_key: Option<String>,

    /// merchant name, overrides the settings file
    #[argh(option)]
    merchant_name: Option<String>,

    /// merchant city, overrides the settings file
    #[argh(option)]
    merchant_city: Option<String>,

    /// postal code (CEP), overrides the settings file
    #[argh(option)]
    postal_code: Option<String>,

    /// amount in reais, e.g. 489.90; omitted or zero leaves it to the payer
    #[argh(option)]
    amount: Option<Amount>,

    /// transaction reference label
    #[argh(option, default = "String::new()")]
    reference: String,

    /// free text shown to the payer
    #[argh(option)]
    description: Option<String>,

    /// merchant category code
    #[argh(option, default = "String::from(\"0000\")")]
    category_code: String,

    /// mark the payload as single use (point of initiation 11)
    #[argh(switch)]
    dynamic: bool,

    /// fail instead of truncating overlong fields or emitting a non-ASCII key
    #[argh(switch)]
    strict: bool,
}

#[derive(FromArgs)]
/// Print the tags of a payload as JSON.
#[argh(subcommand, name = "decode")]
struct DecodeArgs {
    /// payload text, or - to read standard input
    #[argh(positional)]
    payload: String,
}

#[derive(FromArgs)]
/// Check the checksum and the BR Code profile of a payload.
#[argh(subcommand, name = "validate")]
struct ValidateArgs {
    /// payload text, or - to read standard input
    #[argh(positional)]
    payload: String,
}

#[derive(Serialize)]
struct Report<'a> {
    crc_valid:  bool,
    checksum:   String,
    computed:   String,
    key_kind:   Option<PixKeyKind>,
    fields:     BTreeMap<String, String>,
    violations: Vec<String>,
    tags:       &'a [pix_brcode::Tag],
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Args = argh::from_env();
    match args.command {
        Command::Encode(args) => encode(args),
        Command::Decode(args) => decode(&args.payload),
        Command::Validate(args) => validate(&args.payload),
    }
}

fn encode(args: EncodeArgs) -> Result<()> {
    let mut settings = match &args.settings {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading settings {}", path.display()))?;
            serde_json::from_str::<MerchantSettings>(&json)
                .with_context(|| format!("parsing settings {}", path.display()))?
        }
        None => MerchantSettings::default(),
    };
    if let Some(pix_key) = args.pix_key {
        settings.pix_key = pix_key;
        settings.pix_key_type = None;
    }
    if let Some(merchant_name) = args.merchant_name {
        settings.merchant_name = merchant_name;
    }
    if let Some(merchant_city) = args.merchant_city {
        settings.merchant_city = merchant_city;
    }
    if args.postal_code.is_some() {
        settings.postal_code = args.postal_code;
    }

    let mut fields = PixFields::from_settings(&settings, args.reference);
    fields.amount = args.amount;
    fields.description = args.description;

    let strictness = if args.strict {
        Leniency::Strict
    } else {
        Leniency::Warn
    };
    let encoder = Encoder {
        point_of_initiation: if args.dynamic {
            PointOfInitiation::Dynamic
        } else {
            PointOfInitiation::Static
        },
        category_code:       args.category_code,
        truncation:          strictness,
        non_ascii_key:       strictness,
    };
    let payload = encoder.encode(&fields)?;
    info!(checksum = %payload.checksum(), "payload ready");
    println!("{payload}");
    Ok(())
}

fn decode(payload: &str) -> Result<()> {
    let payload = read_payload(payload)?;
    let decoded = parse_payload(&payload)?;
    let report = Report {
        crc_valid:  decoded.crc_valid,
        checksum:   decoded
            .checksum
            .map_or_else(|| "missing".to_owned(), |c| c.to_string()),
        computed:   decoded.computed_checksum.to_string(),
        key_kind:   decoded.pix_key().and_then(PixKeyKind::classify),
        fields:     decoded.fields(),
        violations: decoded.conformance().iter().map(ToString::to_string).collect(),
        tags:       &decoded.tags,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn validate(payload: &str) -> Result<()> {
    let payload = read_payload(payload)?;
    let decoded = parse_payload(&payload)?;
    let violations = decoded.conformance();
    for violation in &violations {
        println!("{violation}");
    }
    if !violations.is_empty() {
        bail!("{} problem(s) found", violations.len());
    }
    println!("valid, checksum {}", decoded.computed_checksum);
    Ok(())
}

fn read_payload(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading payload from stdin")?;
        Ok(text.trim_end_matches(['\r', '\n']).to_owned())
    } else {
        Ok(arg.to_owned())
    }
}
