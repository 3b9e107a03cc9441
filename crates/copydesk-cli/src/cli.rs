use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use copydesk::builder::Studio;
use copydesk::session::SessionHandle;
use copydesk::types::{
    BrandIdentityRequest, CustomerProfileRequest, GenerationKind, GenerationRequest,
    SocialContentRequest, WorksheetRequest,
};

#[derive(Parser, Debug)]
#[command(name = "copydesk", author, version, about = "Stream AI-generated marketing content", long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "COPYDESK_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a generation and print the reconciled result as JSON
    Generate(GenerateArgs),
    /// Store a session token for later runs
    Login {
        token: String,
    },
    /// Forget the stored session token
    Logout,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// customer-profile (persona), brand-identity (brand), worksheet, social-content (content)
    pub kind: GenerationKind,

    #[arg(long = "brand-identity")]
    pub brand_identity: Option<String>,

    #[arg(long)]
    pub workspace: Option<String>,

    #[arg(long)]
    pub worksheet: Option<String>,

    #[arg(long = "customer-profile")]
    pub customer_profile: Option<String>,

    /// Target platform; repeat for several
    #[arg(long = "platform")]
    pub platforms: Vec<String>,

    #[arg(long)]
    pub language: Option<String>,

    /// Brand name hint for brand identity generation
    #[arg(long = "brand-name")]
    pub brand_name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Topic hint for social content
    #[arg(long)]
    pub topic: Option<String>,

    /// Persist the result to the record store
    #[arg(long)]
    pub save: bool,
}

/// A request of any kind, built from the command line
#[derive(Debug, Clone)]
pub enum AnyRequest {
    CustomerProfile(CustomerProfileRequest),
    BrandIdentity(BrandIdentityRequest),
    Worksheet(WorksheetRequest),
    SocialContent(SocialContentRequest),
}

impl AnyRequest {
    pub fn from_args(args: &GenerateArgs, default_language: &str) -> Result<Self> {
        let language = args
            .language
            .clone()
            .unwrap_or_else(|| default_language.to_string());

        let request = match args.kind {
            GenerationKind::CustomerProfile => Self::CustomerProfile(
                CustomerProfileRequest::new(required(&args.brand_identity, "--brand-identity")?)
                    .with_language(language),
            ),
            GenerationKind::BrandIdentity => {
                let mut request = BrandIdentityRequest::new(required(&args.workspace, "--workspace")?)
                    .with_language(language);
                if let Some(name) = &args.brand_name {
                    request = request.with_brand_name(name);
                }
                if let Some(description) = &args.description {
                    request = request.with_description(description);
                }
                Self::BrandIdentity(request)
            }
            GenerationKind::Worksheet => {
                let mut request =
                    WorksheetRequest::new(required(&args.brand_identity, "--brand-identity")?)
                        .with_language(language);
                if let Some(profile) = &args.customer_profile {
                    request = request.with_customer_profile(profile);
                }
                Self::Worksheet(request)
            }
            GenerationKind::SocialContent => {
                let mut request = SocialContentRequest::new(required(&args.worksheet, "--worksheet")?)
                    .platforms(args.platforms.iter().cloned())
                    .with_language(language);
                if let Some(topic) = &args.topic {
                    request = request.with_topic(topic);
                }
                Self::SocialContent(request)
            }
        };

        Ok(request)
    }

    pub fn kind(&self) -> GenerationKind {
        match self {
            Self::CustomerProfile(r) => r.kind(),
            Self::BrandIdentity(r) => r.kind(),
            Self::Worksheet(r) => r.kind(),
            Self::SocialContent(r) => r.kind(),
        }
    }

    pub fn source_id(&self) -> &str {
        match self {
            Self::CustomerProfile(r) => r.source_id(),
            Self::BrandIdentity(r) => r.source_id(),
            Self::Worksheet(r) => r.source_id(),
            Self::SocialContent(r) => r.source_id(),
        }
    }

    /// Start the generation on a background task
    pub fn start(&self, studio: &Studio) -> Result<SessionHandle> {
        match self {
            Self::CustomerProfile(r) => studio.start(r),
            Self::BrandIdentity(r) => studio.start(r),
            Self::Worksheet(r) => studio.start(r),
            Self::SocialContent(r) => studio.start(r),
        }
    }
}

fn required(value: &Option<String>, flag: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => bail!("{} is required for this kind of generation", flag),
    }
}
