//! Search results formatter

use colored::Colorize;

use crate::cli::output::{Formattable, OutputFormat};
use crate::search::SearchResponse;

/// A search response plus the request description it answers.
#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    pub query: String,
    pub response: &'a SearchResponse,
}

impl<'a> SearchResults<'a> {
    pub fn new(query: impl Into<String>, response: &'a SearchResponse) -> Self {
        Self {
            query: query.into(),
            response,
        }
    }

    fn format_human(&self) -> String {
        if self.response.results.is_empty() {
            let mut out = format!(
                "{} No products found for {}\n\n",
                "!".yellow(),
                self.query.cyan()
            );
            out.push_str("Try:\n");
            out.push_str("  - Fewer filters (--category, --brand, --color, price bounds)\n");
            out.push_str("  - `vibe parse` to see which filters the query implies\n");
            out.push_str("  - `vibe stats` to check the catalog has embeddings\n");
            return out;
        }

        let mut out = format!(
            "{} results for {} in {:.2}ms:\n\n",
            self.response.total.to_string().bold(),
            self.query.cyan(),
            self.response.query_time_ms
        );

        for (i, record) in self.response.results.iter().enumerate() {
            out.push_str(&format!(
                "{}. {} {}\n",
                (i + 1).to_string().dimmed(),
                record.title.cyan().bold(),
                format!("[{:.3}]", record.combined_score).dimmed()
            ));

            let mut details = Vec::new();
            if let Some(brand) = &record.brand_name {
                details.push(brand.clone());
            }
            if let Some(category) = &record.category {
                match &record.sub_category {
                    Some(sub) => details.push(format!("{category} / {sub}")),
                    None => details.push(category.clone()),
                }
            }
            if let Some(price) = record.lowest_price {
                details.push(format!("${price:.2}").green().to_string());
            }
            if !details.is_empty() {
                out.push_str(&format!("   {}\n", details.join("  ·  ")));
            }

            out.push_str(&format!(
                "   {}\n",
                format!(
                    "{}  similarity {:.3}",
                    record.product_id, record.similarity
                )
                .dimmed()
            ));
            if let Some(url) = &record.pdp_url {
                out.push_str(&format!("   {}\n", url.dimmed()));
            }
            out.push('\n');
        }

        out
    }

    fn format_plain(&self) -> String {
        self.response
            .results
            .iter()
            .map(|r| format!("{}: {:.4}", r.product_id, r.combined_score))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_tsv(&self) -> String {
        let mut out =
            String::from("product_id\ttitle\tcategory\tbrand\tprice\tsimilarity\tcombined\n");
        for r in &self.response.results {
            let title = r.title.replace(['\t', '\n'], " ");
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{:.4}\t{:.4}\n",
                r.product_id,
                title,
                r.category.as_deref().unwrap_or(""),
                r.brand_name.as_deref().unwrap_or(""),
                r.lowest_price.map(|p| format!("{p:.2}")).unwrap_or_default(),
                r.similarity,
                r.combined_score
            ));
        }
        out
    }

    fn format_jsonl(&self) -> String {
        self.response
            .results
            .iter()
            .filter_map(|r| serde_json::to_string(r).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Formattable for SearchResults<'_> {
    fn format(&self, fmt: OutputFormat) -> String {
        match fmt {
            OutputFormat::Human => self.format_human(),
            OutputFormat::Json => serde_json::to_string_pretty(self.response).unwrap_or_default(),
            OutputFormat::Jsonl => self.format_jsonl(),
            OutputFormat::Plain => self.format_plain(),
            OutputFormat::Tsv => self.format_tsv(),
        }
    }
}
