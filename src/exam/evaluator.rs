// src/exam/evaluator.rs

use crate::models::{
    question::{KIND_CODING, KIND_MCQ, Question},
    result::{AnswerOutcome, ExamStatus},
    test::SubmittedAnswer,
};

/// A coding submission is deemed correct iff it is longer than this many
/// characters. A placeholder policy, not a grader: swap in a real
/// [`CodingJudge`] to change it without touching the evaluation flow.
pub const CODING_MIN_CHARS: usize = 20;

/// Equality policy for MCQ grading.
pub type OptionMatcher = fn(submitted: &str, correct: &str) -> bool;

/// Default MCQ policy: exact string equality. No case-folding, no trimming.
pub fn exact_match(submitted: &str, correct: &str) -> bool {
    submitted == correct
}

/// Pluggable correctness policy for coding questions.
pub trait CodingJudge: Send + Sync {
    fn judge(&self, question: &Question, code: &str) -> bool;
}

/// Default coding policy: "did they type something substantial".
#[derive(Debug, Clone)]
pub struct LengthThresholdJudge {
    pub min_chars: usize,
}

impl Default for LengthThresholdJudge {
    fn default() -> Self {
        Self {
            min_chars: CODING_MIN_CHARS,
        }
    }
}

impl CodingJudge for LengthThresholdJudge {
    fn judge(&self, _question: &Question, code: &str) -> bool {
        code.chars().count() > self.min_chars
    }
}

/// One resolved (question, marks) pair of a test paper, in paper order.
#[derive(Debug, Clone)]
pub struct LoadedQuestion {
    pub question: Question,
    pub marks: i64,
}

/// The scored outcome of one submission, ready to be persisted.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub score: i64,
    pub correct_count: usize,
    pub total_questions: usize,
    pub accuracy: f64,
    pub status: ExamStatus,
    pub outcomes: Vec<AnswerOutcome>,
}

/// The single authoritative scoring step.
///
/// Walks a test's ordered question list, matches submitted answers by
/// question id, grades each per its kind and freezes one outcome per test
/// question. Questions the student never answered score zero marks; they are
/// not an error. The evaluator never mutates questions and never retries.
pub struct Evaluator {
    mcq_matches: OptionMatcher,
    judge: Box<dyn CodingJudge>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            mcq_matches: exact_match,
            judge: Box::new(LengthThresholdJudge::default()),
        }
    }
}

impl Evaluator {
    pub fn new(mcq_matches: OptionMatcher, judge: Box<dyn CodingJudge>) -> Self {
        Self { mcq_matches, judge }
    }

    pub fn evaluate(
        &self,
        paper: &[LoadedQuestion],
        passing_marks: i64,
        answers: &[SubmittedAnswer],
    ) -> Evaluation {
        let mut score = 0i64;
        let mut correct_count = 0usize;
        let mut outcomes = Vec::with_capacity(paper.len());

        for item in paper {
            let question = &item.question;
            let submitted = answers.iter().find(|a| a.question_id == question.id);

            let mut is_correct = false;
            if let Some(ans) = submitted {
                match question.kind.as_str() {
                    KIND_MCQ => {
                        let correct_opt = question.options.0.iter().find(|o| o.is_correct);
                        if let (Some(correct), Some(selected)) =
                            (correct_opt, ans.selected_option.as_deref())
                        {
                            is_correct = (self.mcq_matches)(selected, &correct.text);
                        }
                    }
                    KIND_CODING => {
                        if let Some(code) = ans.code_submitted.as_deref() {
                            is_correct = self.judge.judge(question, code);
                        }
                    }
                    // unknown kinds score incorrect rather than erroring
                    _ => {}
                }
            }

            let marks_obtained = if is_correct { item.marks } else { 0 };
            if is_correct {
                score += item.marks;
                correct_count += 1;
            }

            outcomes.push(AnswerOutcome {
                question_id: question.id,
                selected_option: submitted.and_then(|a| a.selected_option.clone()),
                code_submitted: submitted.and_then(|a| a.code_submitted.clone()),
                is_correct,
                marks_obtained,
            });
        }

        let total_questions = paper.len();
        let accuracy = if total_questions == 0 {
            0.0
        } else {
            (correct_count as f64 / total_questions as f64) * 100.0
        };
        let status = if score >= passing_marks {
            ExamStatus::Pass
        } else {
            ExamStatus::Fail
        };

        Evaluation {
            score,
            correct_count,
            total_questions,
            accuracy,
            status,
            outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{QuestionOption, TestCase};
    use sqlx::types::Json;

    fn mcq(id: i64, options: &[(&str, bool)]) -> Question {
        Question {
            id,
            kind: KIND_MCQ.to_string(),
            subject: "DSA".to_string(),
            topic: "Arrays".to_string(),
            difficulty: "Easy".to_string(),
            text: format!("Question {}", id),
            options: Json(
                options
                    .iter()
                    .map(|(text, is_correct)| QuestionOption {
                        text: text.to_string(),
                        is_correct: *is_correct,
                    })
                    .collect(),
            ),
            code_stub: None,
            test_cases: Json(Vec::new()),
            created_at: None,
        }
    }

    fn coding(id: i64) -> Question {
        Question {
            id,
            kind: KIND_CODING.to_string(),
            subject: "DSA".to_string(),
            topic: "Strings".to_string(),
            difficulty: "Medium".to_string(),
            text: format!("Question {}", id),
            options: Json(Vec::new()),
            code_stub: Some("fn solve() {}".to_string()),
            test_cases: Json(vec![TestCase {
                input: "1".to_string(),
                output: "1".to_string(),
                is_hidden: true,
            }]),
            created_at: None,
        }
    }

    fn answer_mcq(question_id: i64, option: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            selected_option: Some(option.to_string()),
            code_submitted: None,
        }
    }

    fn answer_code(question_id: i64, code: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            selected_option: None,
            code_submitted: Some(code.to_string()),
        }
    }

    #[test]
    fn one_outcome_per_test_question_regardless_of_answers() {
        let paper = vec![
            LoadedQuestion {
                question: mcq(1, &[("A", true), ("B", false)]),
                marks: 5,
            },
            LoadedQuestion {
                question: mcq(2, &[("A", false), ("B", true)]),
                marks: 5,
            },
            LoadedQuestion {
                question: coding(3),
                marks: 10,
            },
        ];

        let ev = Evaluator::default().evaluate(&paper, 5, &[answer_mcq(1, "A")]);
        assert_eq!(ev.outcomes.len(), 3);
        assert_eq!(ev.total_questions, 3);

        // unanswered questions are incorrect with zero marks, not an error
        assert!(!ev.outcomes[1].is_correct);
        assert_eq!(ev.outcomes[1].marks_obtained, 0);
        assert!(ev.outcomes[1].selected_option.is_none());
    }

    #[test]
    fn score_is_sum_of_marks_obtained() {
        let paper = vec![
            LoadedQuestion {
                question: mcq(1, &[("A", true), ("B", false)]),
                marks: 3,
            },
            LoadedQuestion {
                question: mcq(2, &[("A", false), ("B", true)]),
                marks: 7,
            },
        ];

        let answers = vec![answer_mcq(1, "A"), answer_mcq(2, "B")];
        let ev = Evaluator::default().evaluate(&paper, 0, &answers);

        assert_eq!(ev.score, 10);
        assert_eq!(
            ev.score,
            ev.outcomes.iter().map(|o| o.marks_obtained).sum::<i64>()
        );
        assert_eq!(ev.correct_count, 2);
        assert_eq!(ev.accuracy, 100.0);
    }

    #[test]
    fn passing_boundary_is_inclusive() {
        let paper = vec![LoadedQuestion {
            question: mcq(1, &[("A", true)]),
            marks: 5,
        }];

        let ev = Evaluator::default().evaluate(&paper, 5, &[answer_mcq(1, "A")]);
        assert_eq!(ev.score, 5);
        assert_eq!(ev.status, ExamStatus::Pass);

        let ev = Evaluator::default().evaluate(&paper, 6, &[answer_mcq(1, "A")]);
        assert_eq!(ev.status, ExamStatus::Fail);
    }

    #[test]
    fn mcq_match_is_case_and_whitespace_sensitive() {
        let paper = vec![LoadedQuestion {
            question: mcq(1, &[("O(n)", true), ("O(n^2)", false)]),
            marks: 5,
        }];
        let evaluator = Evaluator::default();

        let ev = evaluator.evaluate(&paper, 5, &[answer_mcq(1, "o(n)")]);
        assert!(!ev.outcomes[0].is_correct);

        let ev = evaluator.evaluate(&paper, 5, &[answer_mcq(1, "O(n) ")]);
        assert!(!ev.outcomes[0].is_correct);

        let ev = evaluator.evaluate(&paper, 5, &[answer_mcq(1, "O(n)")]);
        assert!(ev.outcomes[0].is_correct);
    }

    #[test]
    fn garbage_option_text_scores_incorrect() {
        let paper = vec![LoadedQuestion {
            question: mcq(1, &[("A", true), ("B", false)]),
            marks: 5,
        }];

        let ev = Evaluator::default().evaluate(&paper, 5, &[answer_mcq(1, "not even an option")]);
        assert!(!ev.outcomes[0].is_correct);
        assert_eq!(ev.score, 0);
    }

    #[test]
    fn coding_is_a_pure_length_threshold() {
        let paper = vec![LoadedQuestion {
            question: coding(1),
            marks: 10,
        }];
        let evaluator = Evaluator::default();

        // 21 characters of nonsense: correct
        let ev = evaluator.evaluate(&paper, 10, &[answer_code(1, &"x".repeat(21))]);
        assert!(ev.outcomes[0].is_correct);

        // 19 characters: incorrect, however perfect the solution
        let ev = evaluator.evaluate(&paper, 10, &[answer_code(1, &"x".repeat(19))]);
        assert!(!ev.outcomes[0].is_correct);

        // the threshold itself is exclusive
        let ev = evaluator.evaluate(&paper, 10, &[answer_code(1, &"x".repeat(20))]);
        assert!(!ev.outcomes[0].is_correct);
    }

    #[test]
    fn two_mcq_one_correct_one_blank() {
        let paper = vec![
            LoadedQuestion {
                question: mcq(1, &[("A", true), ("B", false)]),
                marks: 5,
            },
            LoadedQuestion {
                question: mcq(2, &[("A", false), ("B", true)]),
                marks: 5,
            },
        ];

        let ev = Evaluator::default().evaluate(&paper, 5, &[answer_mcq(1, "A")]);
        assert_eq!(ev.score, 5);
        assert_eq!(ev.accuracy, 50.0);
        assert_eq!(ev.status, ExamStatus::Pass);
    }

    #[test]
    fn coding_scenario_25_chars_passes() {
        let paper = vec![LoadedQuestion {
            question: coding(1),
            marks: 10,
        }];

        let ev = Evaluator::default().evaluate(&paper, 10, &[answer_code(1, &"y".repeat(25))]);
        assert_eq!(ev.score, 10);
        assert_eq!(ev.accuracy, 100.0);
        assert_eq!(ev.status, ExamStatus::Pass);
    }

    #[test]
    fn empty_submission_scores_zero_everywhere() {
        let paper = vec![
            LoadedQuestion {
                question: mcq(1, &[("A", true)]),
                marks: 5,
            },
            LoadedQuestion {
                question: coding(2),
                marks: 10,
            },
        ];

        let ev = Evaluator::default().evaluate(&paper, 5, &[]);
        assert_eq!(ev.score, 0);
        assert_eq!(ev.accuracy, 0.0);
        assert_eq!(ev.status, ExamStatus::Fail);
        assert_eq!(ev.outcomes.len(), 2);
        assert!(ev.outcomes.iter().all(|o| !o.is_correct));
    }

    #[test]
    fn zero_questions_guards_divide_by_zero() {
        let ev = Evaluator::default().evaluate(&[], 0, &[]);
        assert_eq!(ev.total_questions, 0);
        assert_eq!(ev.accuracy, 0.0);
        // score 0 >= passing 0: a Pass, same as the source behavior
        assert_eq!(ev.status, ExamStatus::Pass);
    }

    #[test]
    fn answers_for_unknown_questions_are_ignored() {
        let paper = vec![LoadedQuestion {
            question: mcq(1, &[("A", true)]),
            marks: 5,
        }];

        let ev = Evaluator::default().evaluate(&paper, 5, &[answer_mcq(99, "A")]);
        assert_eq!(ev.outcomes.len(), 1);
        assert_eq!(ev.outcomes[0].question_id, 1);
        assert_eq!(ev.score, 0);
    }

    #[test]
    fn custom_policies_replace_the_defaults() {
        struct AlwaysRight;
        impl CodingJudge for AlwaysRight {
            fn judge(&self, _question: &Question, _code: &str) -> bool {
                true
            }
        }

        fn folded(submitted: &str, correct: &str) -> bool {
            submitted.eq_ignore_ascii_case(correct)
        }

        let paper = vec![
            LoadedQuestion {
                question: mcq(1, &[("A", true)]),
                marks: 5,
            },
            LoadedQuestion {
                question: coding(2),
                marks: 5,
            },
        ];

        let evaluator = Evaluator::new(folded, Box::new(AlwaysRight));
        let answers = vec![answer_mcq(1, "a"), answer_code(2, "x")];
        let ev = evaluator.evaluate(&paper, 10, &answers);
        assert_eq!(ev.score, 10);
        assert_eq!(ev.status, ExamStatus::Pass);
    }
}
