/// Reusable UI components

use yew::prelude::*;

use crate::analysis::ResultSummary;

#[derive(Properties, PartialEq)]
pub struct VerdictCardProps {
    pub summary: ResultSummary,
}

fn verdict_colors(class: &str) -> (&'static str, &'static str) {
    match class {
        "verdict-true" => ("#e8f5e9", "#10b981"),
        "verdict-false" => ("#ffebee", "#ef4444"),
        "verdict-mixed" => ("#fff3e0", "#f59e0b"),
        _ => ("#f3f4f6", "#6b7280"),
    }
}

/// Verdict, explanation and confidence for one verification
#[function_component(VerdictCard)]
pub fn verdict_card(props: &VerdictCardProps) -> Html {
    let summary = &props.summary;
    let (bg_color, border_color) = verdict_colors(summary.verdict_class());

    html! {
        <div
            class={classes!("result", summary.verdict_class())}
            style={format!("padding: 12px; border-radius: 4px; background-color: {}; border-left: 4px solid {};", bg_color, border_color)}
        >
            <strong>{summary.verdict_label()}</strong>

            if let Some(explanation) = &summary.explanation {
                <p style="margin: 8px 0 0 0; font-size: 13px;">{explanation}</p>
            }

            if let Some(percent) = summary.confidence_percent() {
                <p style="margin: 8px 0 0 0; font-size: 12px; opacity: 0.8;">
                    {format!("Confidence: {}%", percent)}
                </p>
            }

            if let Some(percent) = summary.credibility_percent() {
                <p style="margin: 4px 0 0 0; font-size: 12px; opacity: 0.8;">
                    {format!("Credibility: {}%", percent)}
                </p>
            }

            if let Some(classification) = summary.sentiment.as_ref().and_then(|s| s.classification.clone()) {
                <p style="margin: 4px 0 0 0; font-size: 12px; opacity: 0.8;">
                    {format!("Sentiment: {}", classification)}
                </p>
            }

            if !summary.entities.is_empty() {
                <p style="margin: 4px 0 0 0; font-size: 12px; opacity: 0.8;">
                    {format!("Entities: {}", summary.entities.join(", "))}
                </p>
            }
        </div>
    }
}
