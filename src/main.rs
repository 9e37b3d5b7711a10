// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Showroom CRM command-line client.
//!
//! Signs the consultant in with Google and manages customer records held by
//! the customer API.

use clap::{Args, Parser, Subcommand, ValueEnum};
use showroom_crm::{
    config::Config,
    error::AppError,
    models::ChecklistKey,
    services::GoogleIdentity,
    session::FileStorage,
    views::{
        details::CustomerDetailsView, form::CustomerForm, list::CustomerListView, StatusFilter,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "showroom")]
#[command(about = "Customer records for vehicle sales consultants")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with Google
    Login,
    /// Sign out and revoke the access token
    Logout,
    /// Show the signed-in consultant
    Whoami,
    /// List customers, newest first
    List {
        /// Filter by name, phone, email, NRIC or VSA number
        #[arg(short, long, default_value = "")]
        search: String,
        /// Deal status
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
    },
    /// Search customers on the server
    Search { query: String },
    /// Show one customer
    Show { id: String },
    /// Customer statistics
    Stats,
    /// Create a customer
    Create(CustomerArgs),
    /// Edit a customer; only the given fields change
    Edit {
        id: String,
        #[command(flatten)]
        fields: CustomerArgs,
    },
    /// Delete a customer
    Delete {
        id: String,
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
    /// Set one checklist item, e.g. `check <id> vsaSigned on`
    Check {
        id: String,
        key: String,
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Args, Default)]
struct CustomerArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    nric: Option<String>,
    /// Date of birth, YYYY-MM-DD
    #[arg(long)]
    dob: Option<String>,
    #[arg(long)]
    occupation: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long = "address2")]
    address_continue: Option<String>,
    #[arg(long = "consultant")]
    sales_consultant: Option<String>,
    #[arg(long)]
    vsa_no: Option<String>,
    #[arg(long)]
    deal_closed: Option<bool>,
    #[arg(long)]
    notes: Option<String>,
    /// Checklist items already done (create only)
    #[arg(long = "done")]
    done: Vec<String>,
}

impl CustomerArgs {
    fn apply(self, form: &mut CustomerForm) -> Result<(), AppError> {
        let fields = [
            ("name", self.name),
            ("phone", self.phone),
            ("email", self.email),
            ("nric", self.nric),
            ("dob", self.dob),
            ("occupation", self.occupation),
            ("address", self.address),
            ("addressContinue", self.address_continue),
            ("salesConsultant", self.sales_consultant),
            ("vsaNo", self.vsa_no),
            ("notes", self.notes),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                form.set_field(name, value)?;
            }
        }
        if let Some(closed) = self.deal_closed {
            form.set_deal_closed(closed);
        }
        for key in &self.done {
            form.set_checklist(key.parse()?, true);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_logging(&config);

    let errors = config.validate();
    if !errors.is_empty() {
        tracing::error!("Configuration errors:");
        for error in &errors {
            tracing::error!("  - {}", error);
        }
        return Err(format!("invalid configuration ({} problems)", errors.len()).into());
    }
    tracing::debug!(
        app = %config.app_name,
        version = %config.app_version,
        env = %config.app_env,
        "Configuration valid"
    );

    let storage = Arc::new(FileStorage::session_scoped(config.session_dir.as_deref()));
    let identity = Arc::new(GoogleIdentity::new(&config)?);
    let state = AppState::new(config, identity, storage)?;

    if let Err(e) = run(cli.command, &state).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, state: &AppState) -> Result<(), AppError> {
    let session = &state.session;
    let queries = &state.queries;

    match command {
        Command::Login => {
            session.init().await?;
            let existing = session.current_consultant().filter(|_| session.is_signed_in());
            if let Some(consultant) = existing {
                println!("Already signed in as {} <{}>", consultant.name, consultant.email);
                return Ok(());
            }
            let consultant = session.sign_in().await?;
            println!("Signed in as {} <{}>", consultant.name, consultant.email);
        }
        Command::Logout => {
            session.sign_out().await;
            println!("Signed out");
        }
        Command::Whoami => match session.current_consultant() {
            Some(c) => println!("{} <{}>", c.name, c.email),
            None => println!("Not signed in"),
        },
        command => {
            require_session(state).await?;
            run_customer_command(command, queries).await?;
        }
    }

    Ok(())
}

async fn require_session(state: &AppState) -> Result<(), AppError> {
    state.session.init().await?;
    if !state.session.is_signed_in() {
        eprintln!("Not signed in. Run `showroom login` first.");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

async fn run_customer_command(
    command: Command,
    queries: &showroom_crm::queries::CustomerQueries,
) -> Result<(), AppError> {
    match command {
        Command::List { search, status } => {
            eprintln!("{}", CustomerListView::render_loading());
            let customers = queries.customers().await?;
            let mut view = CustomerListView::new();
            view.set_search(search);
            view.status = status;
            println!("{}", view.render(&customers));
        }
        Command::Search { query } => {
            let results = queries.search(&query).await?.unwrap_or_default();
            println!("{}", CustomerListView::new().render(&results));
        }
        Command::Show { id } => {
            let view = CustomerDetailsView::new(&id);
            match queries.customer(&id).await {
                Ok(Some(customer)) => println!("{}", view.render(&customer)),
                Ok(None) | Err(AppError::NotFound(_)) => {
                    println!("{}", CustomerDetailsView::render_error())
                }
                Err(e) => return Err(e),
            }
        }
        Command::Stats => {
            let stats = queries.stats().await?;
            println!(
                "Customers: {}\nDeals closed: {}\nDeals open: {}\nChecklist complete: {}",
                stats.total, stats.deals_closed, stats.deals_open, stats.checklist_complete
            );
        }
        Command::Create(args) => {
            let mut form = CustomerForm::create();
            args.apply(&mut form)?;
            submit(form, queries).await?;
        }
        Command::Edit { id, fields } => {
            let customer = queries
                .customer(&id)
                .await?
                .ok_or_else(|| AppError::BadRequest("customer id is required".to_string()))?;
            let mut form = CustomerForm::edit(&customer);
            fields.apply(&mut form)?;
            submit(form, queries).await?;
        }
        Command::Delete { id, yes } => {
            let mut view = CustomerDetailsView::new(&id);
            view.request_delete();
            if !yes {
                if let Some(customer) = queries.customer(&id).await? {
                    println!("{}", view.render(&customer));
                }
                println!("Re-run with --yes to delete.");
                return Ok(());
            }
            view.confirm_delete(queries).await?;
            println!("Deleted {}", id);
        }
        Command::Check { id, key, state } => {
            let key: ChecklistKey = key.parse()?;
            let view = CustomerDetailsView::new(&id);
            let customer = view
                .toggle_checklist(queries, key, matches!(state, Toggle::On))
                .await?;
            println!("{}", view.render(&customer));
        }
        Command::Login | Command::Logout | Command::Whoami => {}
    }

    Ok(())
}

async fn submit(
    mut form: CustomerForm,
    queries: &showroom_crm::queries::CustomerQueries,
) -> Result<(), AppError> {
    match form.submit(queries).await {
        Ok(customer) => {
            println!("Saved {} ({})", customer.name, customer.id);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", form.render());
            Err(e)
        }
    }
}

/// Initialize logging on stderr: JSON in production, human-readable otherwise.
fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("showroom_crm=info,warn")
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .init();
    }
}
