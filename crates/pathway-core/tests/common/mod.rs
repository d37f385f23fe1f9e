use std::{fs, path::PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

/// Write a task definition into a fresh temporary directory.
pub fn write_task(name: &str, definition: &Value) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join(format!("{name}.json"));
    fs::write(&path, definition.to_string()).expect("Failed to write task file");
    (temp_dir, path)
}

/// A screening task exercising sections, transforms, cohorts and survey
/// rules.
pub fn screening_definition() -> Value {
    json!({
        "identifier": "screening",
        "progressMarkers": ["welcome", "history", "vitals", "thanks"],
        "steps": [
            { "identifier": "welcome", "type": "instruction", "title": "Welcome" },
            { "identifier": "history", "type": "section", "steps": [
                { "identifier": "smokes", "type": "simpleQuestion",
                  "answerType": { "type": "boolean" },
                  "surveyRules": [ { "matchingAnswer": false, "cohort": "non_smoker" } ] },
                { "identifier": "packs", "type": "simpleQuestion",
                  "answerType": { "type": "integer" },
                  "beforeCohortRules": [ { "requiredCohorts": ["non_smoker"], "operator": "all",
                                           "skipToIdentifier": "nextStep" } ] },
                { "identifier": "age", "type": "simpleQuestion",
                  "answerType": { "type": "integer" },
                  "surveyRules": [ { "matchingAnswer": 18, "ruleOperator": "lt",
                                     "skipToIdentifier": "exit" } ] }
            ] },
            { "identifier": "vitals", "type": "transform",
              "section": { "identifier": "vitals_template", "type": "section", "steps": [
                  { "identifier": "pulse", "type": "simpleQuestion" },
                  { "identifier": "weight", "type": "simpleQuestion" }
              ] },
              "replacementSteps": [ { "identifier": "weight", "title": "Weight (kg)" } ] },
            { "identifier": "age_summary", "type": "feedback", "resultIdentifier": "age" },
            { "identifier": "thanks", "type": "completion" }
        ]
    })
}
