use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::gateway::Repository;
use crate::model::{Assignment, Grade, GradePatch, Id};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeDistribution {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
    #[serde(rename = "F")]
    pub f: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeStats {
    pub average: f64,
    pub total: usize,
    pub letter_grade: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<GradeDistribution>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeFilter {
    pub student_id: Option<Id>,
    pub assignment_id: Option<Id>,
}

/// Letter band for a score; each cutoff is inclusive on its lower bound.
pub fn letter_grade(score: f64) -> &'static str {
    if score >= 90.0 {
        "A"
    } else if score >= 80.0 {
        "B"
    } else if score >= 70.0 {
        "C"
    } else if score >= 60.0 {
        "D"
    } else {
        "F"
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn validate_score(score: f64) -> Result<(), ServiceError> {
    if !score.is_finite() || score < 0.0 {
        return Err(ServiceError::InvalidScore(score));
    }
    Ok(())
}

/// Scores past an assignment's total are kept (extra credit) but noted.
pub fn note_score_against(score: f64, assignment: Option<&Assignment>) {
    if let Some(a) = assignment {
        if a.total_points > 0.0 && score > a.total_points {
            warn!(
                assignment_id = a.id,
                score,
                total_points = a.total_points,
                "score exceeds assignment total"
            );
        }
    }
}

/// Sets one student's score on one assignment, creating the grade row the
/// first time. Repeated calls leave a single row holding the latest score.
pub fn update_grade(
    repo: &mut dyn Repository<Grade>,
    student_id: Id,
    assignment_id: Id,
    score: f64,
    today: NaiveDate,
) -> Result<Option<Grade>, ServiceError> {
    validate_score(score)?;
    let today = today.to_string();

    let existing = repo
        .list()
        .into_iter()
        .find(|g| g.student_id == student_id && g.assignment_id == assignment_id);

    let out = match existing {
        Some(grade) => {
            debug!(id = grade.id, student_id, assignment_id, score, "regrading");
            repo.update(
                grade.id,
                GradePatch {
                    score: Some(score),
                    graded_date: Some(today),
                    ..Default::default()
                },
            )
        }
        None => {
            debug!(student_id, assignment_id, score, "grading");
            repo.create(Grade {
                id: 0,
                name: format!("Grade for {student_id}"),
                student_id,
                assignment_id,
                score,
                submitted_date: today.clone(),
                graded_date: today,
                feedback: String::new(),
            })
        }
    };
    Ok(out)
}

pub fn filter_grades(grades: Vec<Grade>, filter: &GradeFilter) -> Vec<Grade> {
    grades
        .into_iter()
        .filter(|g| filter.student_id.map_or(true, |id| g.student_id == id))
        .filter(|g| filter.assignment_id.map_or(true, |id| g.assignment_id == id))
        .collect()
}

pub fn grade_stats(grades: &[Grade], student_id: Option<Id>) -> GradeStats {
    let relevant: Vec<&Grade> = grades
        .iter()
        .filter(|g| student_id.map_or(true, |id| g.student_id == id))
        .collect();

    if relevant.is_empty() {
        return GradeStats {
            average: 0.0,
            total: 0,
            letter_grade: "N/A",
            distribution: None,
        };
    }

    let total = relevant.len();
    let average = relevant.iter().map(|g| g.score).sum::<f64>() / total as f64;

    let mut distribution = GradeDistribution::default();
    for g in &relevant {
        match letter_grade(g.score) {
            "A" => distribution.a += 1,
            "B" => distribution.b += 1,
            "C" => distribution.c += 1,
            "D" => distribution.d += 1,
            _ => distribution.f += 1,
        }
    }

    GradeStats {
        average: round2(average),
        total,
        letter_grade: letter_grade(average),
        distribution: Some(distribution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Collection;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).expect("date")
    }

    fn grade(student_id: Id, score: f64) -> Grade {
        Grade {
            student_id,
            score,
            ..Default::default()
        }
    }

    #[test]
    fn repeated_updates_leave_one_row_with_the_last_score() {
        let mut repo: Collection<Grade> = Collection::default();
        for score in [55.0, 72.0, 91.0, 84.0] {
            update_grade(&mut repo, 3, 2, score, today()).expect("update");
        }
        assert_eq!(repo.len(), 1);
        let g = repo.get(1).expect("grade");
        assert_eq!(g.score, 84.0);
        assert_eq!(g.student_id, 3);
        assert_eq!(g.assignment_id, 2);
    }

    #[test]
    fn first_grade_stamps_dates_and_empty_feedback() {
        let mut repo: Collection<Grade> = Collection::default();
        let g = update_grade(&mut repo, 1, 1, 70.0, today())
            .expect("update")
            .expect("created");
        assert_eq!(g.submitted_date, "2024-03-04");
        assert_eq!(g.graded_date, "2024-03-04");
        assert_eq!(g.feedback, "");
        assert_eq!(g.name, "Grade for 1");
    }

    #[test]
    fn regrading_moves_graded_date_only() {
        let mut repo = Collection::from_rows(vec![Grade {
            id: 5,
            student_id: 1,
            assignment_id: 1,
            score: 60.0,
            submitted_date: "2024-01-19".into(),
            graded_date: "2024-01-22".into(),
            feedback: "Needs work".into(),
            ..Default::default()
        }]);
        let g = update_grade(&mut repo, 1, 1, 75.0, today())
            .expect("update")
            .expect("updated");
        assert_eq!(g.id, 5);
        assert_eq!(g.submitted_date, "2024-01-19");
        assert_eq!(g.graded_date, "2024-03-04");
        assert_eq!(g.feedback, "Needs work");
    }

    #[test]
    fn invalid_scores_are_rejected_before_writing() {
        let mut repo: Collection<Grade> = Collection::default();
        assert!(update_grade(&mut repo, 1, 1, -1.0, today()).is_err());
        assert!(update_grade(&mut repo, 1, 1, f64::NAN, today()).is_err());
        assert!(update_grade(&mut repo, 1, 1, f64::INFINITY, today()).is_err());
        assert!(repo.is_empty());
        // above-total scores are accepted
        assert!(update_grade(&mut repo, 1, 1, 120.0, today()).is_ok());
    }

    #[test]
    fn scenario_three_grades() {
        let grades = vec![grade(1, 92.0), grade(1, 85.0), grade(1, 77.0)];
        let stats = grade_stats(&grades, Some(1));
        assert_eq!(stats.average, 84.67);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.letter_grade, "B");
        assert_eq!(
            stats.distribution,
            Some(GradeDistribution {
                a: 1,
                b: 1,
                c: 1,
                d: 0,
                f: 0
            })
        );
    }

    #[test]
    fn cutoffs_are_inclusive() {
        assert_eq!(letter_grade(90.0), "A");
        assert_eq!(letter_grade(89.99), "B");
        assert_eq!(letter_grade(80.0), "B");
        assert_eq!(letter_grade(70.0), "C");
        assert_eq!(letter_grade(60.0), "D");
        assert_eq!(letter_grade(59.99), "F");
    }

    #[test]
    fn empty_set_has_no_distribution() {
        let stats = grade_stats(&[grade(2, 88.0)], Some(1));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.letter_grade, "N/A");
        assert!(stats.distribution.is_none());
        let json = serde_json::to_value(&stats).expect("json");
        assert!(json.get("distribution").is_none());
        assert_eq!(json["letterGrade"], "N/A");
    }

    #[test]
    fn unfiltered_stats_cover_every_row() {
        let grades = vec![grade(1, 100.0), grade(2, 50.0), grade(3, 60.0), grade(3, 61.0)];
        let stats = grade_stats(&grades, None);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.average, 67.75);
        assert_eq!(stats.letter_grade, "D");
        let dist = stats.distribution.expect("distribution");
        assert_eq!((dist.a, dist.d, dist.f), (1, 2, 1));
    }

    #[test]
    fn average_matches_sum_over_count() {
        let grades = vec![grade(1, 70.5), grade(1, 81.25), grade(1, 93.0)];
        let stats = grade_stats(&grades, Some(1));
        let expected = ((70.5 + 81.25 + 93.0) / 3.0 * 100.0_f64).round() / 100.0;
        assert_eq!(stats.average, expected);
    }

    #[test]
    fn filters_by_student_and_assignment() {
        let mut a = grade(1, 80.0);
        a.assignment_id = 2;
        let mut b = grade(1, 70.0);
        b.assignment_id = 3;
        let c = grade(2, 90.0);
        let out = filter_grades(
            vec![a.clone(), b, c],
            &GradeFilter {
                student_id: Some(1),
                assignment_id: Some(2),
            },
        );
        assert_eq!(out, vec![a]);
    }
}
