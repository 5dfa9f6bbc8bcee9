use jobboard::application_port::LoginInput;
use jobboard::client::Client;
use jobboard::domain_model::{FeedQuery, PageSize};
use jobboard::logger::*;
use jobboard::session::IdentityStatus;
use jobboard::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let client = Client::try_new(&project_settings)?;

    match cli.command {
        Command::Login { email, password } => {
            client.auth_service.login(LoginInput { email, password }).await?;
            print_identity(client.hydrate().await);
        }
        Command::Whoami => print_identity(client.start().await),
        Command::Feed {
            email,
            password,
            q,
            location,
            limit,
            pages,
        } => {
            client.auth_service.login(LoginInput { email, password }).await?;
            let mut feed = client.feed(FeedQuery {
                q,
                location,
                limit: PageSize::clamped(limit),
                ..Default::default()
            });
            for _ in 0..pages {
                let Some(page) = feed.next_page().await? else {
                    break;
                };
                for job in page {
                    println!("{}\t{}\t{}", job.posted_at.format("%Y-%m-%d"), job.location, job.title);
                }
            }
            if feed.has_more() {
                println!("... more listings available");
            }
        }
    }

    if client.session().is_authenticated() {
        if let Err(e) = client.auth_service.logout().await {
            warn!(error = %e, "logout failed");
        }
    }
    Ok(())
}

fn print_identity(status: IdentityStatus) {
    match status {
        IdentityStatus::Resolved(identity) => println!(
            "{} ({})",
            identity.display_name.unwrap_or_default(),
            identity.role.map(|r| r.to_string()).unwrap_or_default()
        ),
        IdentityStatus::Degraded(reason) => println!("signed in, identity unavailable: {reason}"),
        IdentityStatus::Anonymous | IdentityStatus::Loading => println!("not signed in"),
    }
}
