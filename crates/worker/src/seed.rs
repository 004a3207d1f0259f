use anyhow::Context;
use chrono::NaiveDate;
use mockbq_core::domain::extraction::NewDataExtraction;
use mockbq_core::domain::trade_idea::NewTradeIdea;
use mockbq_core::storage;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct SampleExtraction {
    pub extraction: NewDataExtraction,
    pub trade_ideas: Vec<SampleTradeIdea>,
}

pub struct SampleTradeIdea {
    pub recommendation: String,
    pub summary: String,
    pub conviction: i32,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

fn idea(recommendation: &str, summary: &str, conviction: i32, pros: &[&str], cons: &[&str]) -> SampleTradeIdea {
    SampleTradeIdea {
        recommendation: recommendation.to_string(),
        summary: summary.to_string(),
        conviction,
        pros: strings(pros),
        cons: strings(cons),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn sample(
    title: &str,
    summary: &str,
    date: (i32, u32, u32),
    tags: &[&str],
    pros: &[&str],
    cons: &[&str],
    authors: &[&str],
) -> anyhow::Result<NewDataExtraction> {
    let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2)
        .with_context(|| format!("invalid sample date {date:?}"))?;
    Ok(NewDataExtraction {
        title: title.to_string(),
        summary: summary.to_string(),
        date,
        tags: strings(tags),
        pros: strings(pros),
        cons: strings(cons),
        authors: strings(authors),
    })
}

pub fn sample_rows() -> anyhow::Result<Vec<SampleExtraction>> {
    Ok(vec![
        SampleExtraction {
            extraction: sample(
                "US duration after the pivot",
                "Front-end pricing looks stretched relative to the dot plot.",
                (2025, 3, 14),
                &["Rates", "USA", "Financials"],
                &["Positive carry", "Light positioning"],
                &["Sticky services inflation"],
                &["Macro Strategy"],
            )?,
            trade_ideas: vec![
                idea("Receive 2y SOFR", "Cuts are underpriced into year end.", 7, &["Carry"], &["Data risk"]),
                idea("2s10s steepener", "Curve normalizes as policy eases.", 5, &["Convexity"], &["Term premium"]),
            ],
        },
        SampleExtraction {
            extraction: sample(
                "Brazil real carry check",
                "BRL still offers the best risk-adjusted carry in LatAm.",
                (2025, 4, 2),
                &["FX", "Brazil", "LatAm"],
                &["High real rates"],
                &["Fiscal noise", "Election cycle"],
                &["EM FX Desk", "LatAm Research"],
            )?,
            trade_ideas: vec![idea(
                "Long BRL vs USD",
                "Carry cushions against moderate spot weakness.",
                6,
                &["Carry"],
                &["Fiscal slippage"],
            )],
        },
        SampleExtraction {
            extraction: sample(
                "European energy credit",
                "Integrated majors trade wide of fundamentals.",
                (2025, 5, 20),
                &["Credit", "Energy", "Europe"],
                &["Strong balance sheets"],
                &["Commodity beta"],
                &["Credit Research"],
            )?,
            trade_ideas: vec![],
        },
    ])
}

#[derive(Debug, Default)]
pub struct SeedOutcome {
    pub extractions: usize,
    pub trade_ideas: usize,
}

/// A sample row that passed validation. Trade ideas carry a nil parent id until the extraction
/// is inserted.
pub struct ValidatedSample {
    pub extraction: NewDataExtraction,
    pub trade_ideas: Vec<NewTradeIdea>,
}

/// Validates every extraction and trade idea up front so nothing is written when any sample is
/// bad.
pub fn validate_rows(rows: Vec<SampleExtraction>) -> anyhow::Result<Vec<ValidatedSample>> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let extraction = row
                .extraction
                .validate()
                .with_context(|| format!("sample extraction #{index} failed validation"))?;
            let trade_ideas = row
                .trade_ideas
                .into_iter()
                .map(|template| {
                    NewTradeIdea {
                        data_extraction_id: Uuid::nil(),
                        recommendation: template.recommendation,
                        summary: template.summary,
                        conviction: template.conviction,
                        pros: template.pros,
                        cons: template.cons,
                    }
                    .validate()
                    .with_context(|| {
                        format!("sample trade idea for {:?} failed validation", extraction.title)
                    })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok(ValidatedSample {
                extraction,
                trade_ideas,
            })
        })
        .collect()
}

pub async fn seed(pool: &SqlitePool, rows: Vec<SampleExtraction>) -> anyhow::Result<SeedOutcome> {
    let samples = validate_rows(rows)?;
    let mut outcome = SeedOutcome::default();

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    for sample in samples {
        let created = storage::extractions::insert(&mut *tx, &sample.extraction)
            .await
            .with_context(|| format!("insert sample extraction {:?} failed", sample.extraction.title))?;
        outcome.extractions += 1;

        for mut new_idea in sample.trade_ideas {
            new_idea.data_extraction_id = created.id;
            storage::trade_ideas::insert(&mut *tx, &new_idea)
                .await
                .with_context(|| format!("insert sample trade idea {:?} failed", new_idea.recommendation))?;
            outcome.trade_ideas += 1;
        }

        tracing::debug!(id = %created.id, title = %created.title, "seeded extraction");
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(outcome)
}
