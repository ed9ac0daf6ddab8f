//! vibe search - Search the catalog by text or image
//!
//! Text queries are embedded with the text encoder and ranked against
//! `text_embedding`; images (optionally with a text hint) against
//! `image_embedding`.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::cli::formatters::SearchResults;
use crate::cli::output::{self, OutputFormat, robot_ok};
use crate::error::Result;
use crate::search::{ExplicitFilters, ImageInput, SearchRequest, SearchResponse};

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(subcommand)]
    pub mode: SearchMode,
}

#[derive(Subcommand, Debug)]
pub enum SearchMode {
    /// Natural-language search ("black sneakers under $80")
    Text(TextArgs),
    /// Visual search from an image URL or file, with an optional text hint
    Image(ImageArgs),
}

#[derive(Args, Debug)]
pub struct TextArgs {
    /// Search query
    pub query: String,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("source").required(true).args(["url", "file"])
))]
pub struct ImageArgs {
    /// Image URL
    #[arg(long)]
    pub url: Option<String>,

    /// Local image file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Text hint fused with the image ("but in red")
    #[arg(long)]
    pub text: Option<String>,

    /// Image share of the fused embedding, 0.0-1.0 (default from config)
    #[arg(long)]
    pub image_weight: Option<f32>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

/// Explicit filters; these always win over values inferred from the query.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Maximum number of results (default from config)
    #[arg(long, short)]
    pub limit: Option<u32>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub brand: Option<String>,

    #[arg(long)]
    pub min_price: Option<f64>,

    #[arg(long)]
    pub max_price: Option<f64>,

    /// Color filter; repeatable or comma-separated, any match passes
    #[arg(long, value_delimiter = ',')]
    pub color: Vec<String>,

    #[arg(long)]
    pub gender: Option<String>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> ExplicitFilters {
        ExplicitFilters {
            category: self.category.clone(),
            brand: self.brand.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            colors: (!self.color.is_empty()).then(|| self.color.clone()),
            gender: self.gender.clone(),
        }
    }
}

impl TextArgs {
    pub fn to_request(&self) -> SearchRequest {
        let mut request = SearchRequest::text(self.query.clone()).with_filters(self.filters.to_filters());
        request.limit = self.filters.limit;
        request
    }
}

impl ImageArgs {
    pub fn to_request(&self) -> Result<SearchRequest> {
        let image = match (&self.url, &self.file) {
            (Some(url), _) => ImageInput::Url(url.clone()),
            (None, Some(path)) => ImageInput::Bytes(std::fs::read(path)?),
            (None, None) => {
                return Err(crate::error::VibeError::InvalidRequest(
                    "--url or --file is required".to_string(),
                ));
            }
        };

        let mut request = SearchRequest::image(image).with_filters(self.filters.to_filters());
        request.text = self.text.clone();
        request.image_weight = self.image_weight;
        request.limit = self.filters.limit;
        Ok(request)
    }
}

pub fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let request = match &args.mode {
        SearchMode::Text(text) => text.to_request(),
        SearchMode::Image(image) => image.to_request()?,
    };

    let response = ctx.executor.execute(&ctx.services, &request)?;
    emit_response(ctx.output_format, &request.describe(), &response)
}

fn emit_response(format: OutputFormat, query: &str, response: &SearchResponse) -> Result<()> {
    if format == OutputFormat::Json {
        return output::emit_json(&robot_ok(response));
    }
    output::emit(&SearchResults::new(query, response), format);
    Ok(())
}
