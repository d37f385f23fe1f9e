#[cfg(test)]
mod navigator_tests {
    use serde_json::json;

    use crate::{
        error::NavigatorError,
        models::{AnswerResult, CohortOperator, CohortRule, CohortSet, Step, TaskResult},
        navigator::{Direction, NavigatorOptions, Progress, StepNavigator},
    };

    fn instructions(ids: &[&str]) -> Vec<Step> {
        ids.iter().map(|id| Step::instruction(*id)).collect()
    }

    fn navigator(steps: Vec<Step>) -> StepNavigator {
        StepNavigator::new(steps).expect("unique identifiers")
    }

    fn cohorts(names: &[&str]) -> CohortSet {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    fn visited(ids: &[&str]) -> TaskResult {
        let mut result = TaskResult::new("task");
        for id in ids {
            result.append_step_history(Step::instruction(*id).instantiate_result());
        }
        result
    }

    fn next_id<'a>(
        navigator: &'a StepNavigator,
        after: Option<&str>,
        result: &TaskResult,
        cohorts: &CohortSet,
    ) -> Option<&'a str> {
        navigator
            .step_after(after, result, cohorts, false)
            .expect("navigation should succeed")
            .identifier()
    }

    #[test]
    fn test_forward_backward_asymmetry() {
        let nav = navigator(instructions(&["s1", "s2", "s3"]));
        let result = TaskResult::new("task");
        let none = CohortSet::new();

        assert_eq!(next_id(&nav, None, &result, &none), Some("s1"));
        assert_eq!(next_id(&nav, Some("s1"), &result, &none), Some("s2"));
        assert_eq!(next_id(&nav, Some("s3"), &result, &none), None);
        assert_eq!(
            nav.step_before("s2", &result, &none).unwrap().map(|s| s.identifier.as_str()),
            Some("s1")
        );
        assert!(nav.step_before("s1", &result, &none).unwrap().is_none());
    }

    #[test]
    fn test_navigation_is_deterministic() {
        let nav = navigator(vec![
            Step::instruction("s1"),
            Step::instruction("s2").with_before_rule(CohortRule::new(["x"])),
            Step::instruction("s3"),
        ]);
        let result = visited(&["s1"]);
        let current = cohorts(&["x"]);

        let first = nav.step_after(Some("s1"), &result, &current, false).unwrap();
        for _ in 0..10 {
            let again = nav.step_after(Some("s1"), &result, &current, false).unwrap();
            assert_eq!(again, first);
        }
        assert_eq!(first.identifier(), Some("s3"));
    }

    #[test]
    fn test_explicit_jump_bypasses_order() {
        let nav = navigator(vec![
            Step::instruction("s1").with_next_step("s3"),
            Step::instruction("s2"),
            Step::instruction("s3"),
        ]);
        let result = TaskResult::new("task");
        let none = CohortSet::new();

        assert_eq!(next_id(&nav, Some("s1"), &result, &none), Some("s3"));
        assert_eq!(
            nav.step_before("s3", &result, &none).unwrap().map(|s| s.identifier.as_str()),
            Some("s2")
        );
    }

    #[test]
    fn test_jump_target_still_evaluates_skip_rules() {
        let nav = navigator(vec![
            Step::instruction("s1").with_next_step("s3"),
            Step::instruction("s2"),
            Step::instruction("s3").with_before_rule(CohortRule::new(["x"])),
            Step::instruction("s4"),
        ]);
        let result = TaskResult::new("task");
        assert_eq!(next_id(&nav, Some("s1"), &result, &cohorts(&["x"])), Some("s4"));
    }

    #[test]
    fn test_cohort_skip_without_redirect() {
        let nav = navigator(vec![
            Step::instruction("s1"),
            Step::instruction("s2").with_before_rule(CohortRule::new(["x"])),
            Step::instruction("s3"),
        ]);
        let result = TaskResult::new("task");

        assert_eq!(next_id(&nav, Some("s1"), &result, &cohorts(&["x"])), Some("s3"));
        assert_eq!(next_id(&nav, Some("s1"), &result, &CohortSet::new()), Some("s2"));
        // Backward navigation passes over the skipped step too.
        assert_eq!(
            nav.step_before("s3", &result, &cohorts(&["x"]))
                .unwrap()
                .map(|s| s.identifier.as_str()),
            Some("s1")
        );
    }

    #[test]
    fn test_cohort_redirect_is_bounded() {
        let nav = navigator(vec![
            Step::instruction("s1"),
            Step::instruction("s2").with_before_rule(CohortRule::new(["x"]).with_skip_to("s1")),
            Step::instruction("s3"),
        ]);
        let result = TaskResult::new("task");

        assert_eq!(next_id(&nav, Some("s1"), &result, &cohorts(&["x"])), Some("s1"));
        assert_eq!(next_id(&nav, Some("s1"), &result, &CohortSet::new()), Some("s2"));
    }

    #[test]
    fn test_cyclic_cohort_redirects_terminate() {
        let steps = vec![
            Step::instruction("s1"),
            Step::instruction("s2").with_before_rule(CohortRule::new(["x"]).with_skip_to("s3")),
            Step::instruction("s3").with_before_rule(CohortRule::new(["x"]).with_skip_to("s2")),
        ];
        let result = TaskResult::new("task");
        let current = cohorts(&["x"]);

        let nav = navigator(steps.clone());
        assert_eq!(next_id(&nav, Some("s1"), &result, &current), Some("s3"));

        let nav = navigator(steps).with_options(NavigatorOptions {
            max_cohort_redirects: 2,
        });
        assert_eq!(next_id(&nav, Some("s1"), &result, &current), Some("s2"));
    }

    #[test]
    fn test_empty_cohort_rules_in_navigation() {
        let empty: [&str; 0] = [];
        let nav = navigator(vec![
            Step::instruction("s1"),
            Step::instruction("s2").with_before_rule(CohortRule::new(empty)),
            Step::instruction("s3")
                .with_before_rule(CohortRule::new(empty).with_operator(CohortOperator::Any)),
        ]);
        let result = TaskResult::new("task");
        assert_eq!(next_id(&nav, Some("s1"), &result, &CohortSet::new()), Some("s3"));
    }

    #[test]
    fn test_result_summary_self_skip() {
        let nav = navigator(vec![
            Step::instruction("q"),
            Step::result_summary("feedback", "foo"),
            Step::instruction("end"),
        ]);
        let none = CohortSet::new();

        let mut result = visited(&["q"]);
        assert_eq!(next_id(&nav, Some("q"), &result, &none), Some("end"));

        result.append_step_history(AnswerResult::new("foo", json!(7)).into());
        assert_eq!(next_id(&nav, Some("q"), &result, &none), Some("feedback"));
    }

    #[test]
    fn test_after_rule_takes_precedence_over_next_step_identifier() {
        let nav = navigator(vec![
            Step::instruction("s1")
                .with_next_step("s3")
                .with_after_rule(CohortRule::new(["x"]).with_skip_to("s2")),
            Step::instruction("s2"),
            Step::instruction("s3"),
        ]);
        let result = TaskResult::new("task");

        assert_eq!(next_id(&nav, Some("s1"), &result, &cohorts(&["x"])), Some("s2"));
        assert_eq!(next_id(&nav, Some("s1"), &result, &CohortSet::new()), Some("s3"));
    }

    #[test]
    fn test_after_rule_without_target_ends_the_list() {
        let nav = navigator(vec![
            Step::instruction("s1").with_after_rule(CohortRule::new(["x"])),
            Step::instruction("s2"),
        ]);
        let outcome = nav
            .step_after(Some("s1"), &TaskResult::new("task"), &cohorts(&["x"]), false)
            .unwrap();
        assert!(outcome.step.is_none());
        assert!(!outcome.exit_early);
    }

    #[test]
    fn test_override_consumed_only_when_not_peeking() {
        let nav = navigator(instructions(&["s1", "s2", "s3"]));
        let mut step_result = Step::instruction("s1").instantiate_result();
        step_result.set_skip_to_identifier(Some("s3".to_string()));
        let mut result = TaskResult::new("task");
        result.append_step_history(step_result);
        let none = CohortSet::new();

        let committed = nav.step_after(Some("s1"), &result, &none, false).unwrap();
        let peeked = nav.step_after(Some("s1"), &result, &none, true).unwrap();

        assert_eq!(committed.identifier(), Some("s3"));
        assert_eq!(peeked.identifier(), Some("s2"));
        // Querying never changes the result.
        assert_eq!(
            result.find_result("s1").and_then(|r| r.skip_to_identifier()),
            Some("s3")
        );
    }

    #[test]
    fn test_exit_ends_the_task() {
        let nav = navigator(vec![
            Step::instruction("s1").with_next_step("exit"),
            Step::instruction("s2"),
        ]);
        let result = TaskResult::new("task");
        let none = CohortSet::new();

        let outcome = nav.step_after(Some("s1"), &result, &none, false).unwrap();
        assert!(outcome.step.is_none());
        assert!(outcome.exit_early);
        assert!(nav.should_exit("s1", &result, &none).unwrap());
        assert!(!nav.has_step_after(Some("s1"), &result, &none).unwrap());
    }

    #[test]
    fn test_jump_to_visited_step_is_reverse() {
        let nav = navigator(vec![
            Step::instruction("s1"),
            Step::instruction("s2").with_next_step("s1"),
        ]);
        let outcome = nav
            .step_after(Some("s2"), &visited(&["s1", "s2"]), &CohortSet::new(), false)
            .unwrap();
        assert_eq!(outcome.identifier(), Some("s1"));
        assert_eq!(outcome.direction, Direction::Reverse);

        let first = nav
            .step_after(None, &TaskResult::new("task"), &CohortSet::new(), false)
            .unwrap();
        assert_eq!(first.direction, Direction::Forward);
    }

    #[test]
    fn test_caller_errors_fail_fast() {
        let nav = navigator(vec![
            Step::instruction("s1").with_next_step("nowhere"),
            Step::instruction("s2"),
        ]);
        let result = TaskResult::new("task");
        let none = CohortSet::new();

        let err = nav.step_after(Some("ghost"), &result, &none, false).unwrap_err();
        assert!(matches!(err, NavigatorError::StepNotFound { ref identifier } if identifier == "ghost"));

        let err = nav.step_after(Some("s1"), &result, &none, false).unwrap_err();
        assert!(matches!(
            err,
            NavigatorError::SkipTargetNotFound { ref target, ref from } if target == "nowhere" && from == "s1"
        ));

        assert!(nav.step_before("ghost", &result, &none).is_err());
    }

    #[test]
    fn test_duplicate_identifiers_rejected() {
        let err = StepNavigator::new(instructions(&["a", "b", "a"])).unwrap_err();
        assert!(matches!(err, NavigatorError::DuplicateIdentifier { ref identifier, .. } if identifier == "a"));
    }

    #[test]
    fn test_has_step_before_and_last_step() {
        let nav = navigator(vec![
            Step::instruction("s1"),
            Step::instruction("s2"),
            Step::instruction("s3").with_before_rule(CohortRule::new(["x"])),
        ]);
        let result = TaskResult::new("task");
        assert!(!nav.has_step_before("s1", &result, &CohortSet::new()).unwrap());
        assert!(nav.has_step_before("s2", &result, &CohortSet::new()).unwrap());
        assert_eq!(
            nav.last_step(&result, &cohorts(&["x"])).map(|s| s.identifier.as_str()),
            Some("s2")
        );
    }

    #[test]
    fn test_progress_with_markers() {
        let nav = navigator(instructions(&["s1", "s2", "s3"])).with_progress_markers(["s1", "s3"]);
        let none = CohortSet::new();

        assert_eq!(
            nav.progress("s1", &TaskResult::new("task"), &none).unwrap(),
            Some(Progress {
                current: 1,
                total: 2,
                is_estimated: false
            })
        );
        assert_eq!(
            nav.progress("s2", &visited(&["s1"]), &none).unwrap(),
            Some(Progress {
                current: 1,
                total: 2,
                is_estimated: false
            })
        );
        assert_eq!(
            nav.progress("s3", &visited(&["s1", "s2"]), &none).unwrap(),
            Some(Progress {
                current: 2,
                total: 2,
                is_estimated: false
            })
        );
    }

    #[test]
    fn test_progress_beyond_last_marker_is_none() {
        let nav = navigator(instructions(&["s1", "s2", "s3", "s4"])).with_progress_markers(["s1", "s3"]);
        assert_eq!(
            nav.progress("s4", &visited(&["s1", "s2", "s3"]), &CohortSet::new())
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_progress_estimated_without_markers() {
        let nav = navigator(vec![
            Step::instruction("s1"),
            Step::instruction("s2").with_before_rule(CohortRule::new(["x"])),
            Step::instruction("s3"),
        ]);
        let result = TaskResult::new("task");

        assert_eq!(
            nav.progress("s1", &result, &CohortSet::new()).unwrap(),
            Some(Progress {
                current: 1,
                total: 3,
                is_estimated: true
            })
        );
        assert_eq!(
            nav.progress("s3", &visited(&["s1"]), &cohorts(&["x"])).unwrap(),
            Some(Progress {
                current: 2,
                total: 2,
                is_estimated: true
            })
        );
    }

    #[test]
    fn test_progress_edge_cases() {
        let single = navigator(instructions(&["only"]));
        assert_eq!(
            single.progress("only", &TaskResult::new("task"), &CohortSet::new()).unwrap(),
            None
        );

        let nav = navigator(instructions(&["s1", "s2"]));
        assert!(matches!(
            nav.progress("ghost", &TaskResult::new("task"), &CohortSet::new()),
            Err(NavigatorError::StepNotFound { .. })
        ));
    }

    #[test]
    fn test_copy_and_insert_preserves_progress_markers() {
        let ids = ["step1", "step2", "step3", "step4"];
        let nav = navigator(instructions(&ids)).with_progress_markers(ids);
        let section = Step::section("section", navigator(instructions(&["a", "b", "c"])));

        let copy = nav.copy_and_insert(section, None).unwrap();

        let order: Vec<&str> = copy.steps().iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(order, vec!["step1", "section", "step2", "step3", "step4"]);
        assert_eq!(
            copy.progress_markers().map(<[String]>::to_vec),
            Some(
                ["step1", "section", "step2", "step3", "step4"]
                    .map(String::from)
                    .to_vec()
            )
        );
        assert_eq!(copy.insert_after_identifier(), Some("section"));
        // The original navigator is unchanged.
        assert_eq!(nav.len(), 4);
    }

    #[test]
    fn test_insert_follows_anchor_and_rejects_duplicates() {
        let mut nav = navigator(instructions(&["s1", "s2", "s3"])).with_insert_after("s2");
        nav.insert(Step::instruction("x"), None).unwrap();
        nav.insert(Step::instruction("y"), None).unwrap();
        nav.insert(Step::instruction("z"), Some("s1")).unwrap();

        let order: Vec<&str> = nav.steps().iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(order, vec!["s1", "z", "s2", "x", "y", "s3"]);

        let err = nav.insert(Step::instruction("s3"), None).unwrap_err();
        assert!(matches!(err, NavigatorError::DuplicateIdentifier { .. }));
    }

    #[test]
    fn test_insert_marker_goes_first_without_prior_marker() {
        let mut nav = navigator(instructions(&["s1", "s2", "s3"])).with_progress_markers(["s2", "s3"]);
        nav.insert(Step::instruction("new"), None).unwrap();
        assert_eq!(
            nav.progress_markers().map(<[String]>::to_vec),
            Some(["new", "s2", "s3"].map(String::from).to_vec())
        );
    }

    #[test]
    fn test_copy_and_remove_drops_steps_and_markers() {
        let nav = navigator(instructions(&["s1", "s2", "s3"]))
            .with_progress_markers(["s1", "s2", "s3"])
            .with_insert_after("s1");
        let copy = nav.copy_and_remove(&["s2", "missing"]);

        let order: Vec<&str> = copy.steps().iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(order, vec!["s1", "s3"]);
        assert_eq!(
            copy.progress_markers().map(<[String]>::to_vec),
            Some(["s1", "s3"].map(String::from).to_vec())
        );
        assert_eq!(copy.insert_after_identifier(), Some("s1"));
    }
}
