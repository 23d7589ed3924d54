use crate::infra::{build_request_service, parse_policy};
use clap::{Args, ValueEnum};
use omnisorter::config::AppConfig;
use omnisorter::error::AppError;
use omnisorter::workflows::request::{
    DocumentKind, FieldSchema, FieldValueMap, FieldView, HiddenFieldPolicy, RequestSession,
};
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum KindArg {
    Quotation,
    Drawing,
}

impl From<KindArg> for DocumentKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Quotation => DocumentKind::Quotation,
            KindArg::Drawing => DocumentKind::Drawing,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum DocumentArg {
    Quotation,
    Drawing,
    #[default]
    Both,
}

impl DocumentArg {
    fn kinds(self) -> Vec<DocumentKind> {
        match self {
            DocumentArg::Quotation => vec![DocumentKind::Quotation],
            DocumentArg::Drawing => vec![DocumentKind::Drawing],
            DocumentArg::Both => DocumentKind::ordered().to_vec(),
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct FieldsArgs {
    /// Only list fields used by one document
    #[arg(long, value_enum)]
    pub(crate) kind: Option<KindArg>,
    /// Print the catalog as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ComposeArgs {
    /// JSON value map (`{"本体構成": {"段": "4"}}`); `-` reads stdin
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Which request text to print
    #[arg(long, value_enum, default_value_t = DocumentArg::Both)]
    pub(crate) document: DocumentArg,
    /// Hidden-field policy (purge or retain); defaults to OMNISORTER_HIDDEN_FIELDS
    #[arg(long, value_parser = parse_policy)]
    pub(crate) policy: Option<HiddenFieldPolicy>,
}

pub(crate) fn run_fields(args: FieldsArgs) -> Result<(), AppError> {
    let views = FieldSchema::standard().views(args.kind.map(DocumentKind::from));
    if args.json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    for view in &views {
        println!("{}", describe_field(view));
    }
    Ok(())
}

fn describe_field(view: &FieldView) -> String {
    let documents: Vec<&str> = view.documents.iter().map(|kind| kind.label()).collect();
    let mut line = format!("{:<24} [{}]", view.key, documents.join(","));
    if !view.choices.is_empty() {
        line.push_str(&format!(" {}", view.choices.join(" | ")));
    } else if let Some(unit) = view.quantity_unit {
        line.push_str(&format!(" (derived options, {})", unit.counter()));
    }
    if !view.note.is_empty() {
        line.push_str(&format!(" ; {}", view.note));
    }
    if let Some(rule) = &view.visible_when {
        line.push_str(&format!(" ; when {rule}"));
    }
    line
}

fn read_input(path: &PathBuf) -> Result<String, AppError> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    Ok(std::fs::read_to_string(path)?)
}

pub(crate) fn compose_output(
    values: FieldValueMap,
    policy: HiddenFieldPolicy,
    document: DocumentArg,
) -> String {
    let session = RequestSession::from_values(values, policy);
    document
        .kinds()
        .into_iter()
        .map(|kind| session.document(kind).render())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn run_compose(args: ComposeArgs) -> Result<(), AppError> {
    let policy = match args.policy {
        Some(policy) => policy,
        None => AppConfig::load()?.form.hidden_fields,
    };
    let values: FieldValueMap = serde_json::from_str(&read_input(&args.input)?)?;
    println!("{}", compose_output(values, policy, args.document));
    Ok(())
}

pub(crate) async fn run_diagnose() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_request_service(&config)?;
    let report = service.diagnose().await;
    print!("{report}");
    println!(
        "overall: {}",
        if report.ok { "ok" } else { "no database reachable" }
    );
    Ok(())
}
