//! Patient-facing explanations and follow-up recommendations per label

const UNKNOWN_EXPLANATION: &str = "The AI could not confidently classify this nodule. Please re-scan with a clearer image or consult a specialist.";

const EXPLANATIONS: &[(&str, &str)] = &[
    (
        "Benign",
        "A non-cancerous growth. It does not spread to other parts of the body and is usually harmless unless it grows large enough to press on nearby structures.",
    ),
    (
        "Malignant",
        "Cancerous cells detected. Requires immediate medical attention and further diagnostic testing (FNAC/Biopsy).",
    ),
    (
        "Papillary Thyroid Carcinoma",
        "The most common form of thyroid cancer (80% of cases). It usually grows slowly and typically spreads to lymph nodes in the neck. Highly curable.",
    ),
    (
        "Follicular Thyroid Carcinoma",
        "The second most common type (10-15%). It is more likely to spread to distant organs like lungs or bones via the blood.",
    ),
    (
        "Anaplastic Thyroid Carcinoma",
        "A rare and aggressive form of thyroid cancer (less than 2%). It grows very quickly and spreads rapidly. Urgent oncologist referral is critical.",
    ),
    (
        "Medullary Thyroid Carcinoma",
        "A rare cancer (4%) that develops from C-cells. It can be genetic (MEN2 syndrome). Requires checking Calcitonin levels.",
    ),
];

const RECOMMENDATIONS: &[(&str, &str)] = &[
    ("Benign", "Follow-up scan / Routine monitoring"),
    ("Papillary Thyroid Carcinoma", "FNAC / Possible Lobectomy"),
    (
        "Follicular Thyroid Carcinoma",
        "Diagnostic Hemithyroidectomy / Histopathology",
    ),
    (
        "Anaplastic Thyroid Carcinoma",
        "Urgent Oncologist Referral / Palliative Care",
    ),
    (
        "Medullary Thyroid Carcinoma",
        "Serum Calcitonin Test / Total Thyroidectomy",
    ),
];

const DEFAULT_RECOMMENDATION: &str = "Clinical Correlation Required";

/// Look up a label; short subtype names ("Papillary") match their full name.
fn lookup(table: &'static [(&'static str, &'static str)], label: &str) -> Option<&'static str> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(label))
        .or_else(|| {
            table.iter().find(|(key, _)| {
                key.split_whitespace()
                    .next()
                    .is_some_and(|first| first.eq_ignore_ascii_case(label))
            })
        })
        .map(|(_, text)| *text)
}

/// Explanation for a diagnosis or subtype label, falling back to the "Unknown" entry
pub fn medical_explanation(label: &str) -> &'static str {
    lookup(EXPLANATIONS, label).unwrap_or(UNKNOWN_EXPLANATION)
}

/// Recommended follow-up for a subtype label
pub fn recommendation_for(subtype: &str) -> &'static str {
    lookup(RECOMMENDATIONS, subtype).unwrap_or(DEFAULT_RECOMMENDATION)
}
