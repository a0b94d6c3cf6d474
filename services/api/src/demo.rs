use crate::infra::{connect_gateway, demo_gateway};
use chrono::NaiveDate;
use clap::Args;
use society_desk::community::{NoticeBoard, ResidentDirectory};
use society_desk::config::AppConfig;
use society_desk::error::AppError;
use society_desk::maintenance::{
    BoardView, FilterCriteria, MaintenanceBoard, MaintenancePriority, MaintenanceRequest,
    MaintenanceRequestDraft, MaintenanceStatus, PriorityFilter, RequestCreationService,
    RequestRepository, StatsSummary, StatusFilter,
};

#[derive(Args, Debug, Default)]
pub(crate) struct ListArgs {
    /// Status to show (pending, in_progress, completed or all)
    #[arg(long, value_parser = StatusFilter::parse)]
    pub(crate) status: Option<StatusFilter>,
    /// Priority to show (low, medium, high or all)
    #[arg(long, value_parser = PriorityFilter::parse)]
    pub(crate) priority: Option<PriorityFilter>,
    /// Case-insensitive text matched against title and description
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Earliest creation date to include (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) from: Option<NaiveDate>,
    /// Latest creation date to include (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) to: Option<NaiveDate>,
}

impl ListArgs {
    fn criteria(self) -> FilterCriteria {
        FilterCriteria {
            status: self.status.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            search: self.search.unwrap_or_default(),
            date_from: self.from,
            date_to: self.to,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct CreateArgs {
    #[arg(long)]
    pub(crate) title: String,
    #[arg(long)]
    pub(crate) description: String,
    /// Flat or common area where the problem is
    #[arg(long)]
    pub(crate) location: String,
    /// low, medium or high
    #[arg(long, default_value = "medium", value_parser = parse_priority)]
    pub(crate) priority: MaintenancePriority,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ResidentsArgs {
    /// Case-insensitive text matched against name, flat and email
    #[arg(long)]
    pub(crate) search: Option<String>,
}

fn parse_priority(raw: &str) -> Result<MaintenancePriority, String> {
    MaintenancePriority::parse(raw).ok_or_else(|| format!("unknown priority '{raw}'"))
}

pub(crate) async fn run_list(args: ListArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let gateway = connect_gateway(&config).await?;
    let criteria = args.criteria();

    let requests = RequestRepository::new(gateway)
        .list_requests(&criteria)
        .await?;
    render_requests(&requests);
    Ok(())
}

pub(crate) async fn run_stats() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let gateway = connect_gateway(&config).await?;

    let stats = RequestRepository::new(gateway).get_stats().await?;
    render_stats(&stats);
    Ok(())
}

pub(crate) async fn run_create(args: CreateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let gateway = connect_gateway(&config).await?;
    let draft = MaintenanceRequestDraft::new(
        &args.title,
        &args.description,
        &args.location,
        args.priority,
    );

    let created = RequestCreationService::new(gateway)
        .create_request(&draft)
        .await?;
    println!(
        "Filed request {} ({}, {} priority)",
        created.id.0,
        created.status.label(),
        created.priority.label()
    );
    Ok(())
}

pub(crate) fn run_notices() {
    println!("Notices & Updates");
    for notice in NoticeBoard::standard().latest() {
        println!(
            "- [{:?}] {} | {} | {:?} priority",
            notice.kind,
            notice.title,
            notice.display_date(),
            notice.priority
        );
        println!("  {}", notice.description);
    }
}

pub(crate) fn run_residents(args: ResidentsArgs) {
    let directory = ResidentDirectory::standard();
    let residents = directory.search(args.search.as_deref().unwrap_or_default());
    println!("Residents Directory ({} shown)", residents.len());
    for resident in residents {
        println!(
            "- {} | {} | {} | {}",
            resident.name, resident.flat, resident.phone, resident.email
        );
    }
}

/// Walks the maintenance board through a refresh, a filter change and a
/// submission against the seeded in-memory backend.
pub(crate) async fn run_demo() -> Result<(), AppError> {
    println!("Society desk demo");
    let board = MaintenanceBoard::new(demo_gateway());

    let view = board.refresh().await;
    println!("\nAll requests");
    render_view(&view);

    let view = board
        .apply_filters(FilterCriteria::default().with_status(MaintenanceStatus::Pending))
        .await;
    println!("\nPending only");
    render_view(&view);

    let draft = MaintenanceRequestDraft::new(
        "Leak",
        "Water under sink",
        "Flat 3B",
        MaintenancePriority::High,
    );
    let created = board.submit(&draft).await?;
    println!("\nFiled '{}' as {}", created.title, created.status.label());
    render_view(&board.view());

    let rejected = board.submit(&MaintenanceRequestDraft::default()).await;
    if let Err(err) = rejected {
        println!("\nBlank form rejected: {err}");
    }

    println!();
    run_notices();
    println!();
    run_residents(ResidentsArgs::default());
    Ok(())
}

fn render_view(view: &BoardView) {
    render_stats(&view.stats);
    if let Some(error) = &view.error {
        println!("  error: {error}");
    }
    render_requests(&view.requests);
}

fn render_stats(stats: &StatsSummary) {
    let counts: Vec<String> = MaintenanceStatus::ordered()
        .into_iter()
        .map(|status| format!("{} {}", status.label(), stats.count(status)))
        .collect();
    println!("  {}", counts.join(" | "));
}

fn render_requests(requests: &[MaintenanceRequest]) {
    if requests.is_empty() {
        println!("  No maintenance requests match the current filters.");
        return;
    }
    for request in requests {
        println!(
            "  - {} [{} / {}] {} @ {}",
            request.created_at.format("%Y-%m-%d"),
            request.status.label(),
            request.priority.label(),
            request.title,
            request.location
        );
    }
}
