//! Due-date queries over the jobs collection.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::models::{JobMap, Task};

/// Days after today that count as "this week".
pub const WEEK_AHEAD_DAYS: u64 = 7;

/// A task together with where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub job_id: String,
    pub job_name: String,
    pub project_id: String,
    pub project_title: String,
    pub task: Task,
}

/// Dashboard view of upcoming work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agenda {
    pub today: NaiveDate,
    /// Tasks due exactly today
    pub due_today: Vec<TaskRef>,
    /// Tasks due after today, up to a week ahead
    pub this_week: Vec<TaskRef>,
}

impl Agenda {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.due_today.is_empty() && self.this_week.is_empty()
    }
}

fn tasks_with_due_dates(jobs: &JobMap) -> impl Iterator<Item = (NaiveDate, TaskRef)> + '_ {
    jobs.values().flat_map(|job| {
        job.projects.values().flat_map(move |project| {
            project.tasks.values().filter_map(move |task| {
                task.due_date.map(|due| {
                    (
                        due,
                        TaskRef {
                            job_id: job.id.clone(),
                            job_name: job.name.clone(),
                            project_id: project.id.clone(),
                            project_title: project.title.clone(),
                            task: task.clone(),
                        },
                    )
                })
            })
        })
    })
}

/// Higher priority first, then by name.
fn sort_refs(refs: &mut [TaskRef]) {
    refs.sort_by(|a, b| {
        b.task
            .priority
            .cmp(&a.task.priority)
            .then_with(|| a.task.name.cmp(&b.task.name))
    });
}

/// Every task due on `date`.
#[must_use]
pub fn tasks_due_on(jobs: &JobMap, date: NaiveDate) -> Vec<TaskRef> {
    let mut refs: Vec<_> = tasks_with_due_dates(jobs)
        .filter(|(due, _)| *due == date)
        .map(|(_, task)| task)
        .collect();
    sort_refs(&mut refs);
    refs
}

/// Tasks due today and tasks due within the following week.
#[must_use]
pub fn build_agenda(jobs: &JobMap, today: NaiveDate) -> Agenda {
    let week_end = today
        .checked_add_days(Days::new(WEEK_AHEAD_DAYS))
        .unwrap_or(NaiveDate::MAX);

    let mut agenda = Agenda {
        today,
        ..Agenda::default()
    };
    for (due, task) in tasks_with_due_dates(jobs) {
        if due == today {
            agenda.due_today.push(task);
        } else if due > today && due <= week_end {
            agenda.this_week.push(task);
        }
    }

    sort_refs(&mut agenda.due_today);
    agenda.this_week.sort_by(|a, b| {
        a.task
            .due_date
            .cmp(&b.task.due_date)
            .then_with(|| a.task.name.cmp(&b.task.name))
    });
    agenda
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, Priority, Project};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn task(id: &str, due: Option<NaiveDate>, priority: Priority) -> Task {
        Task {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            status: crate::models::TaskStatus::NotStarted,
            priority,
            due_date: due,
            notes: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    fn jobs(tasks: Vec<Task>) -> JobMap {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let project = Project {
            id: "project_site_1".to_string(),
            title: "Site".to_string(),
            description: String::new(),
            status: crate::models::ProjectStatus::Active,
            priority: Priority::Medium,
            due_date: None,
            notes: String::new(),
            tasks: tasks.into_iter().map(|t| (t.id.clone(), t)).collect(),
            created_at,
            updated_at: None,
        };
        let job = Job {
            id: "job_acme_1".to_string(),
            name: "Acme".to_string(),
            description: String::new(),
            notes: String::new(),
            projects: BTreeMap::from([(project.id.clone(), project)]),
            created_at,
            updated_at: None,
        };
        BTreeMap::from([(job.id.clone(), job)])
    }

    #[test]
    fn tasks_due_on_matches_exact_day() {
        let jobs = jobs(vec![
            task("a", Some(date(10)), Priority::Low),
            task("b", Some(date(11)), Priority::Low),
            task("c", None, Priority::High),
        ]);

        let due = tasks_due_on(&jobs, date(10));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].task.id, "a");
        assert_eq!(due[0].job_name, "Acme");
        assert_eq!(due[0].project_title, "Site");
    }

    #[test]
    fn agenda_splits_today_and_week() {
        let jobs = jobs(vec![
            task("overdue", Some(date(9)), Priority::High),
            task("today_low", Some(date(10)), Priority::Low),
            task("today_high", Some(date(10)), Priority::High),
            task("tomorrow", Some(date(11)), Priority::Medium),
            task("week_edge", Some(date(17)), Priority::Medium),
            task("too_far", Some(date(18)), Priority::Medium),
        ]);

        let agenda = build_agenda(&jobs, date(10));
        let today: Vec<_> = agenda.due_today.iter().map(|r| r.task.id.as_str()).collect();
        let week: Vec<_> = agenda.this_week.iter().map(|r| r.task.id.as_str()).collect();

        assert_eq!(today, vec!["today_high", "today_low"]);
        assert_eq!(week, vec!["tomorrow", "week_edge"]);
    }

    #[test]
    fn empty_agenda() {
        let agenda = build_agenda(&BTreeMap::new(), date(1));
        assert!(agenda.is_empty());
    }
}
