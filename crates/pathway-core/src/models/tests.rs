#[cfg(test)]
mod model_tests {
    use serde_json::json;

    use crate::models::{
        evaluate_rules, AnswerResult, AnswerType, BaseType, CohortChange, CohortOperator,
        CohortRule, CohortSet, CollectionResult, NavigationTarget, Question, RulePhase, Step,
        StepKind, StepResult, StepType, SurveyRule, SurveyRuleOperator, TaskResult,
    };

    fn cohorts(names: &[&str]) -> CohortSet {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    fn answered(identifier: &str, value: serde_json::Value) -> TaskResult {
        let mut result = TaskResult::new("task");
        result.append_step_history(AnswerResult::new(identifier, value).into());
        result
    }

    fn rule(operator: SurveyRuleOperator, value: serde_json::Value, skip_to: &str) -> SurveyRule {
        SurveyRule {
            skip_to_identifier: Some(skip_to.to_string()),
            matching_answer: Some(value),
            rule_operator: Some(operator),
            cohort: None,
        }
    }

    // Cohort rules

    #[test]
    fn test_cohort_rule_all_and_any() {
        let current = cohorts(&["diabetic", "smoker"]);
        assert!(CohortRule::new(["diabetic", "smoker"]).matches(&current));
        assert!(!CohortRule::new(["diabetic", "runner"]).matches(&current));
        assert!(CohortRule::new(["diabetic", "runner"])
            .with_operator(CohortOperator::Any)
            .matches(&current));
        assert!(!CohortRule::new(["runner"])
            .with_operator(CohortOperator::Any)
            .matches(&current));
    }

    #[test]
    fn test_empty_required_cohorts() {
        let empty: [&str; 0] = [];
        let none = CohortSet::new();
        assert!(CohortRule::new(empty).matches(&none));
        assert!(CohortRule::new(empty).matches(&cohorts(&["x"])));
        assert!(!CohortRule::new(empty)
            .with_operator(CohortOperator::Any)
            .matches(&cohorts(&["x"])));
    }

    #[test]
    fn test_cohort_operator_defaults_to_all_when_omitted() {
        let rule: CohortRule =
            serde_json::from_value(json!({ "requiredCohorts": ["a", "b"] })).unwrap();
        assert_eq!(rule.cohort_operator, None);
        assert_eq!(rule.operator(), CohortOperator::All);
        assert!(!rule.matches(&cohorts(&["a"])));

        let any: CohortRule = serde_json::from_value(
            json!({ "requiredCohorts": ["a", "b"], "operator": "any", "skipToIdentifier": "s2" }),
        )
        .unwrap();
        assert_eq!(any.operator(), CohortOperator::Any);
        assert!(any.matches(&cohorts(&["a"])));
    }

    #[test]
    fn test_cohort_rule_target_by_phase() {
        let skip = CohortRule::new(["x"]);
        assert_eq!(skip.target(RulePhase::Before), NavigationTarget::NextStep);
        assert_eq!(skip.target(RulePhase::After), NavigationTarget::NextSection);

        let redirect = CohortRule::new(["x"]).with_skip_to("s1");
        assert_eq!(
            redirect.target(RulePhase::Before),
            NavigationTarget::Step("s1".to_string())
        );
        assert_eq!(
            CohortRule::new(["x"]).with_skip_to("exit").target(RulePhase::After),
            NavigationTarget::Exit
        );
    }

    #[test]
    fn test_cohort_change_adds_then_removes() {
        let mut current = cohorts(&["a", "b"]);
        let change = CohortChange {
            add: cohorts(&["c"]),
            remove: cohorts(&["a"]),
        };
        change.apply_to(&mut current);
        assert_eq!(current, cohorts(&["b", "c"]));
        assert!(CohortChange::default().is_empty());
    }

    #[test]
    fn test_navigation_target_reserved_words() {
        assert_eq!(NavigationTarget::parse("exit"), NavigationTarget::Exit);
        assert_eq!(NavigationTarget::parse("nextStep"), NavigationTarget::NextStep);
        assert_eq!(NavigationTarget::parse("nextSection"), NavigationTarget::NextSection);
        assert!(NavigationTarget::is_reserved("exit"));
        assert!(!NavigationTarget::is_reserved("step1"));
        assert_eq!(format!("{}", NavigationTarget::NextSection), "nextSection");
    }

    // Results

    #[test]
    fn test_collection_replace_on_duplicate() {
        let mut collection = CollectionResult::new("form");
        assert!(collection
            .append_input_result(AnswerResult::new("a", json!(3)).into())
            .is_none());
        collection.append_input_result(AnswerResult::new("b", json!("x")).into());

        let previous = collection.append_input_result(AnswerResult::new("a", json!(8)).into());

        assert_eq!(previous.and_then(|r| r.answer_value().cloned()), Some(json!(3)));
        assert_eq!(
            collection.find_answer_result("a").map(|a| a.value.clone()),
            Some(json!(8))
        );
        assert_eq!(collection.children.len(), 2);
        // Replaced entries move to the end.
        assert_eq!(collection.children[1].identifier(), "a");
    }

    #[test]
    fn test_collection_remove_input_result() {
        let mut collection = CollectionResult::new("form");
        collection.append_input_result(AnswerResult::new("a", json!(1)).into());
        assert!(collection.remove_input_result("a").is_some());
        assert!(collection.remove_input_result("a").is_none());
        assert!(collection.find_result("a").is_none());
    }

    #[test]
    fn test_step_history_keeps_audit_trail() {
        let mut result = TaskResult::new("task");
        result.append_step_history(AnswerResult::new("q1", json!(1)).into());
        result.append_step_history(AnswerResult::new("q2", json!(2)).into());
        let previous = result.append_step_history(AnswerResult::new("q1", json!(5)).into());

        assert!(previous.is_some());
        assert_eq!(result.visited_identifiers(), vec!["q2", "q1"]);
        assert_eq!(result.step_history.len(), 3);
        assert_eq!(
            result.find_answer_result("q1").map(|a| a.value.clone()),
            Some(json!(5))
        );
        assert_eq!(result.step_path(), "q2, q1");
    }

    #[test]
    fn test_remove_step_history_splits_navigation_view() {
        let mut result = TaskResult::new("task");
        for id in ["s1", "s2", "s3"] {
            result.append_step_history(Step::instruction(id).instantiate_result());
        }
        let removed = result.remove_step_history("s2");
        let removed_ids: Vec<&str> = removed.iter().map(StepResult::identifier).collect();

        assert_eq!(removed_ids, vec!["s2", "s3"]);
        assert_eq!(result.visited_identifiers(), vec!["s1"]);
        assert_eq!(result.step_history.len(), 3);
        assert!(result.remove_step_history("missing").is_empty());
    }

    #[test]
    fn test_find_answer_searches_nested_and_async_results() {
        let mut section = TaskResult::new("section");
        section.append_step_history(AnswerResult::new("inner", json!(true)).into());

        let mut result = TaskResult::new("task");
        result.append_step_history(StepResult::Section(section));
        result.append_async_result(AnswerResult::new("sensor", json!(72.5)).into());

        assert_eq!(
            result.find_answer_result("inner").map(|a| a.value.clone()),
            Some(json!(true))
        );
        assert_eq!(
            result.find_answer_result("sensor").map(|a| a.value.clone()),
            Some(json!(72.5))
        );
        assert!(result.find_answer_result("nothing").is_none());
    }

    #[test]
    fn test_take_skip_to_respects_peeking() {
        let mut step_result = Step::instruction("s1").instantiate_result();
        step_result.set_skip_to_identifier(Some("s3".to_string()));

        let (peeked, step_result) = step_result.take_skip_to(true);
        assert_eq!(peeked, None);
        assert_eq!(step_result.skip_to_identifier(), Some("s3"));

        let (taken, step_result) = step_result.take_skip_to(false);
        assert_eq!(taken.as_deref(), Some("s3"));
        assert_eq!(step_result.skip_to_identifier(), None);
    }

    #[test]
    fn test_answer_result_wire_format() {
        let answer = AnswerResult::new("age", json!(42));
        let json = serde_json::to_value(StepResult::from(answer)).unwrap();
        assert_eq!(json["type"], "answer");
        assert_eq!(json["identifier"], "age");
        assert_eq!(json["value"], 42);
        assert_eq!(json["answerType"]["type"], "integer");

        let decoded: StepResult = serde_json::from_value(json!({
            "type": "answer",
            "identifier": "colors",
            "answerType": { "type": "array", "baseType": "string" },
            "value": ["red", "blue"]
        }))
        .unwrap();
        let StepResult::Answer(decoded) = decoded else {
            panic!("expected an answer result");
        };
        assert_eq!(
            decoded.answer_type,
            Some(AnswerType::Array {
                base_type: BaseType::String,
                sequence_separator: None
            })
        );
    }

    #[test]
    fn test_collection_accepts_input_results_alias() {
        let decoded: StepResult = serde_json::from_value(json!({
            "type": "collection",
            "identifier": "form",
            "startDate": "2024-05-01T10:00:00Z",
            "inputResults": [{ "type": "answer", "identifier": "a", "value": null }]
        }))
        .unwrap();
        let StepResult::Collection(collection) = decoded else {
            panic!("expected a collection result");
        };
        assert_eq!(collection.children.len(), 1);
        assert_eq!(collection.start_date.to_string(), "2024-05-01T10:00:00Z");
        assert!(!collection.find_answer_result("a").unwrap().has_value());
    }

    #[test]
    fn test_unknown_result_type_is_rejected() {
        let decoded: Result<StepResult, _> =
            serde_json::from_value(json!({ "type": "mystery", "identifier": "x" }));
        assert!(decoded.is_err());
    }

    #[test]
    fn test_task_result_wire_format_has_children_and_history() {
        let mut result = TaskResult::new("task");
        result.append_step_history(AnswerResult::new("q1", json!("yes")).into());
        let json = serde_json::to_value(StepResult::Task(result)).unwrap();

        assert_eq!(json["type"], "task");
        assert_eq!(json["children"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["stepHistory"].as_array().map(Vec::len), Some(1));
        assert!(json.get("asyncResults").is_none());
    }

    #[test]
    fn test_answer_type_inference() {
        assert_eq!(AnswerType::infer(&json!(null)), None);
        assert_eq!(AnswerType::infer(&json!(3)), Some(AnswerType::Integer));
        assert_eq!(AnswerType::infer(&json!(3.5)), Some(AnswerType::Number));
        assert_eq!(AnswerType::infer(&json!({"a": 1})), Some(AnswerType::Object));
        assert!(AnswerType::infer(&json!([1, 2])).is_some_and(|t| t.is_array()));
    }

    // Survey rules

    #[test]
    fn test_survey_rule_operators() {
        let five = AnswerResult::new("q", json!(5));
        assert!(rule(SurveyRuleOperator::Equal, json!(5.0), "x").matches(Some(&five)));
        assert!(rule(SurveyRuleOperator::NotEqual, json!(4), "x").matches(Some(&five)));
        assert!(rule(SurveyRuleOperator::GreaterThan, json!(4), "x").matches(Some(&five)));
        assert!(!rule(SurveyRuleOperator::LessThan, json!(5), "x").matches(Some(&five)));
        assert!(rule(SurveyRuleOperator::LessThanEqual, json!(5), "x").matches(Some(&five)));
        assert!(rule(SurveyRuleOperator::GreaterThanEqual, json!(5), "x").matches(Some(&five)));

        let colors = AnswerResult::new("q", json!(["red", "blue"]));
        assert!(rule(SurveyRuleOperator::Equal, json!("red"), "x").matches(Some(&colors)));
        assert!(rule(SurveyRuleOperator::OtherThan, json!("green"), "x").matches(Some(&colors)));
        assert!(!rule(SurveyRuleOperator::OtherThan, json!("red"), "x").matches(Some(&colors)));
    }

    #[test]
    fn test_survey_rule_skip_operator() {
        let skipped = SurveyRule::default();
        assert_eq!(skipped.operator(), SurveyRuleOperator::Skip);
        assert!(skipped.is_valid());
        assert!(skipped.matches(None));
        assert!(skipped.matches(Some(&AnswerResult::new("q", json!(null)))));
        assert!(!skipped.matches(Some(&AnswerResult::new("q", json!(1)))));
        assert_eq!(skipped.skip_target(), "exit");
    }

    #[test]
    fn test_evaluate_rules_requires_exactly_one_match() {
        let rules = vec![
            rule(SurveyRuleOperator::GreaterThan, json!(10), "high"),
            rule(SurveyRuleOperator::GreaterThan, json!(20), "veryHigh"),
        ];
        let fifteen = AnswerResult::new("q", json!(15));
        let twenty_five = AnswerResult::new("q", json!(25));
        let five = AnswerResult::new("q", json!(5));

        assert_eq!(evaluate_rules(&rules, None, Some(&fifteen)), Some("high"));
        assert_eq!(evaluate_rules(&rules, None, Some(&twenty_five)), None);
        assert_eq!(evaluate_rules(&rules, None, Some(&five)), None);
        assert_eq!(evaluate_rules(&rules, Some("skipped"), None), Some("skipped"));
        assert_eq!(evaluate_rules(&rules, Some("skipped"), Some(&five)), None);
    }

    #[test]
    fn test_cohort_only_rule_never_jumps() {
        let rules = vec![SurveyRule {
            matching_answer: Some(json!(true)),
            cohort: Some("smoker".to_string()),
            ..Default::default()
        }];
        let yes = AnswerResult::new("q", json!(true));
        assert_eq!(evaluate_rules(&rules, None, Some(&yes)), None);
    }

    // Steps

    #[test]
    fn test_result_summary_skips_until_answered() {
        let step = Step::result_summary("feedback", "foo");
        let mut result = TaskResult::new("task");
        assert!(step.should_skip(&result, false));

        let mut section = TaskResult::new("section");
        section.append_step_history(AnswerResult::new("foo", json!(12)).into());
        result.append_step_history(StepResult::Section(section));
        assert!(!step.should_skip(&result, false));
    }

    #[test]
    fn test_result_summary_with_step_result_identifier() {
        let mut step = Step::result_summary("feedback", "score");
        if let StepKind::ResultSummary(summary) = &mut step.kind {
            summary.step_result_identifier = Some("round2".to_string());
        }
        let mut round1 = TaskResult::new("round1");
        round1.append_step_history(AnswerResult::new("score", json!(3)).into());
        let mut result = TaskResult::new("task");
        result.append_step_history(StepResult::Section(round1));
        assert!(step.should_skip(&result, false));

        let mut round2 = TaskResult::new("round2");
        round2.append_step_history(AnswerResult::new("score", json!(4)).into());
        result.append_step_history(StepResult::Section(round2));
        assert!(!step.should_skip(&result, false));
    }

    #[test]
    fn test_next_step_identifier_override_only_when_not_peeking() {
        let step = Step::instruction("s1").with_next_step("s4");
        let mut step_result = step.instantiate_result();
        step_result.set_skip_to_identifier(Some("s3".to_string()));
        let mut result = TaskResult::new("task");
        result.append_step_history(step_result);

        assert_eq!(step.next_step_identifier(&result, false).as_deref(), Some("s3"));
        assert_eq!(step.next_step_identifier(&result, true).as_deref(), Some("s4"));
    }

    #[test]
    fn test_question_survey_rule_jump() {
        let step = Step::question(
            "smoke",
            Question {
                survey_rules: vec![rule(SurveyRuleOperator::Equal, json!(false), "done")],
                ..Default::default()
            },
        );
        assert_eq!(
            step.next_step_identifier(&answered("smoke", json!(false)), false)
                .as_deref(),
            Some("done")
        );
        assert_eq!(
            step.next_step_identifier(&answered("smoke", json!(false)), true),
            None
        );
        assert_eq!(
            step.next_step_identifier(&answered("smoke", json!(true)), false),
            None
        );
    }

    #[test]
    fn test_cohorts_to_apply_from_survey_rules() {
        let step = Step::question(
            "smoke",
            Question {
                survey_rules: vec![SurveyRule {
                    matching_answer: Some(json!(true)),
                    cohort: Some("smoker".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            },
        );
        let yes = step
            .cohorts_to_apply(&answered("smoke", json!(true)))
            .unwrap();
        assert_eq!(yes.add, cohorts(&["smoker"]));
        assert!(yes.remove.is_empty());

        let no = step
            .cohorts_to_apply(&answered("smoke", json!(false)))
            .unwrap();
        assert_eq!(no.remove, cohorts(&["smoker"]));
        assert!(Step::instruction("s1")
            .cohorts_to_apply(&TaskResult::new("task"))
            .is_none());
    }

    #[test]
    fn test_instantiate_result_by_kind() {
        let question = Step::question(
            "q",
            Question {
                answer_type: Some(AnswerType::Boolean),
                ..Default::default()
            },
        );
        let StepResult::Answer(answer) = question.instantiate_result() else {
            panic!("questions produce answer results");
        };
        assert_eq!(answer.answer_type, Some(AnswerType::Boolean));
        assert!(!answer.has_value());
        assert!(answer.end_date.is_none());

        assert_eq!(Step::instruction("i").instantiate_result().type_tag(), "base");
    }

    #[test]
    fn test_copy_with_identifier_is_deep() {
        let original = Step::instruction("s1")
            .with_title("Welcome")
            .with_before_rule(CohortRule::new(["x"]));
        let mut copy = original.copy_with_identifier("s1b");
        copy.title = Some("Changed".to_string());

        assert_eq!(copy.identifier, "s1b");
        assert_eq!(copy.before_cohort_rules, original.before_cohort_rules);
        assert_eq!(original.title.as_deref(), Some("Welcome"));
    }

    #[test]
    fn test_step_json_round_trips_header_fields() {
        let step = Step::instruction("s1")
            .with_next_step("s3")
            .with_after_rule(CohortRule::new(["x"]).with_operator(CohortOperator::Any));
        let json = serde_json::to_value(&step).unwrap();

        assert_eq!(json["type"], "instruction");
        assert_eq!(json["nextStepIdentifier"], "s3");
        assert_eq!(json["afterCohortRules"][0]["operator"], "any");
        assert!(json.get("beforeCohortRules").is_none());
    }

    #[test]
    fn test_step_type_tags() {
        assert_eq!(StepType::from("simpleQuestion"), StepType::SimpleQuestion);
        assert_eq!(StepType::from("taskInfo").to_string(), "taskInfo");
        assert_eq!(
            StepType::from("consent"),
            StepType::Custom("consent".to_string())
        );
        assert!(StepType::ChoiceQuestion.is_question());
        assert!(!StepType::Section.is_question());
    }
}
