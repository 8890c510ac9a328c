//! Subcommand handlers

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use fieldops_client::{
    ClientConfig, DragKey, DropKey, DropOutcome, FieldOps, IssueFilter, SessionStore,
};
use shared::models::{AssignProjectRequest, IssueStatus, IssueType};

use crate::SessionAction;

/// Connect and load every collection. A saved session supplies the token
/// when none was given.
async fn connect(mut config: ClientConfig) -> Result<FieldOps> {
    if config.token.is_none()
        && let Some(dir) = &config.session_dir
        && let Some(session) = SessionStore::new(dir).load()?
    {
        config = config.with_token(session.token);
    }
    let ops = FieldOps::new(config).context("failed to build HTTP client")?;
    ops.bootstrap().await;
    Ok(ops)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn dashboard(config: ClientConfig, json: bool) -> Result<()> {
    let ops = connect(config).await?;
    let metrics = ops.metrics(Utc::now()).await;

    if json {
        return print_json(&metrics);
    }

    println!(
        "Empleados: {} ({} técnicos), asistencia {}%",
        metrics.employees_total, metrics.technicians, metrics.attendance_rate
    );
    let pct = metrics.project_percentages;
    println!(
        "Proyectos: {} total · activos {:.0}% · en progreso {:.0}% · completados {:.0}%",
        metrics.projects.total, pct.active, pct.in_progress, pct.completed
    );
    println!("Días restantes (media): {}", metrics.average_days_remaining);
    println!(
        "Incidencias: {} pendientes, {} en revisión, {} resueltas ({:.0}% resueltas)",
        metrics.issues.pending,
        metrics.issues.in_review,
        metrics.issues.resolved,
        metrics.issues.resolution_rate
    );

    if !metrics.delayed_project_ids.is_empty() {
        println!("Proyectos retrasados:");
        for id in &metrics.delayed_project_ids {
            if let Some(project) = ops.projects().get(*id).await {
                let end = project
                    .end_date
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                println!("  #{} {} ({}%, fin {})", project.id, project.name, project.progress, end);
            }
        }
    }

    for (name, snapshot_error) in [
        ("projects", ops.projects().snapshot().await.error),
        ("employees", ops.employees().snapshot().await.error),
        ("issues", ops.issues().snapshot().await.error),
    ] {
        if let Some(e) = snapshot_error {
            eprintln!("warning: {name} could not be loaded: {e}");
        }
    }
    Ok(())
}

pub async fn issues(
    config: ClientConfig,
    project: Option<String>,
    issue_type: Option<IssueType>,
    status: Option<IssueStatus>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let ops = connect(config).await?;
    if let Some(e) = ops.issues().snapshot().await.error {
        bail!("could not load issues: {e}");
    }

    let filter = IssueFilter {
        project,
        issue_type,
        status,
        date,
    };
    print_json(&ops.issues().filtered(&filter).await)
}

pub async fn assign(config: ClientConfig, technician: i64, issue: i64) -> Result<()> {
    let ops = connect(config).await?;
    let matcher = ops.matcher();

    matcher
        .drag_start(&DragKey(technician).to_string())
        .await
        .with_context(|| format!("cannot pick technician {technician}"))?;
    let outcome = matcher
        .drop_on(Some(&DropKey(issue).to_string()))
        .await
        .with_context(|| format!("cannot assign issue {issue}"))?;

    print_outcome(outcome)
}

pub async fn unassign(config: ClientConfig, issue: i64) -> Result<()> {
    let ops = connect(config).await?;
    let outcome = ops
        .matcher()
        .unassign(issue)
        .await
        .with_context(|| format!("cannot unassign issue {issue}"))?;
    print_outcome(outcome)
}

fn print_outcome(outcome: DropOutcome) -> Result<()> {
    match outcome {
        DropOutcome::NoTarget => {
            println!("no change");
            Ok(())
        }
        DropOutcome::Assigned {
            issue,
            previous_user_id,
        } => {
            if let Some(previous) = previous_user_id
                && issue.assigned_user_id != Some(previous)
            {
                eprintln!("replaced previous technician {previous}");
            }
            print_json(&issue)
        }
    }
}

pub async fn report(config: ClientConfig, project: i64) -> Result<()> {
    let ops = connect(config).await?;
    let report = ops
        .report(project, Utc::now())
        .await
        .with_context(|| format!("cannot build report for project {project}"))?;
    print_json(&report)
}

pub async fn employee_projects(
    config: ClientConfig,
    employee: i64,
    assign: Vec<i64>,
    unassign: Vec<i64>,
) -> Result<()> {
    if assign.is_empty() && unassign.is_empty() {
        bail!("nothing to do: pass --assign and/or --unassign");
    }
    let ops = connect(config).await?;

    let changes: Vec<AssignProjectRequest> = assign
        .into_iter()
        .map(AssignProjectRequest::assign)
        .chain(unassign.into_iter().map(AssignProjectRequest::unassign))
        .collect();
    let outcome = ops.assigner().apply(employee, &changes).await;

    println!("{} of {} changes applied", outcome.applied.len(), changes.len());
    if let Some((project_id, e)) = outcome.failed {
        return Err(anyhow::Error::new(e).context(format!("project {project_id} failed")));
    }

    if let Some(updated) = ops.employees().get(employee).await {
        let projects = ops.projects().items().await;
        println!("{}: {}", updated.name, updated.project_names(&projects));
    }
    Ok(())
}

pub fn session(config: &ClientConfig, action: SessionAction) -> Result<()> {
    let dir = config
        .session_dir
        .as_deref()
        .context("no session directory configured")?;
    let store = SessionStore::new(dir);

    match action {
        SessionAction::Login { token, user } => {
            let user = serde_json::from_str(&user).context("--user must be a JSON object")?;
            store.save(token, user)?;
            println!("session saved to {}", store.path().display());
        }
        SessionAction::Impersonate { token, user } => {
            let user = serde_json::from_str(&user).context("--user must be a JSON object")?;
            store.begin_impersonation(token, user)?;
            println!("now acting as the given user; run `fieldops session restore` to go back");
        }
        SessionAction::Restore => {
            let original = store.return_to_original()?;
            println!("restored session for {}", original.user);
        }
        SessionAction::Show => match store.load()? {
            Some(session) => {
                print_json(&serde_json::json!({
                    "user": session.user,
                    "impersonating": store.is_impersonating()?,
                }))?;
            }
            None => println!("no session"),
        },
    }
    Ok(())
}
