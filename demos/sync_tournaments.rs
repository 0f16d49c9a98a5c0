use std::sync::Arc;

use volleynet_sync::sync::{
    MemoryPlayerRepository, MemoryTeamRepository, MemoryTournamentRepository, SyncService,
    TracingPublisher,
};
use volleynet_sync::{ClientConfig, Gender, SyncConfig, VolleynetClient};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = VolleynetClient::with_config(ClientConfig::default()).unwrap();
    let tournaments = MemoryTournamentRepository::new();
    let teams = MemoryTeamRepository::new();
    let players = MemoryPlayerRepository::new();

    let service = SyncService::new(
        Arc::new(client),
        Arc::new(tournaments.clone()),
        Arc::new(teams.clone()),
        Arc::new(players.clone()),
        Arc::new(TracingPublisher),
    )
    .with_config(SyncConfig { detail_workers: 4 });

    for league in ["AMATEUR TOUR", "PRO TOUR"] {
        println!("Syncing {league}");
        let report = service
            .tournaments(Gender::Female, league, 2024)
            .await
            .unwrap();
        println!(
            "{} new, {} updated, {} failed",
            report.changes.tournaments.new.len(),
            report.changes.tournaments.updated.len(),
            report.failed.len()
        );
    }

    for tournament in tournaments.all().await {
        println!(
            "#{} {} ({}) {} teams",
            tournament.id(),
            tournament.info.name,
            tournament.status(),
            tournament.signedup_teams
        );
    }
    println!(
        "{} teams and {} players stored",
        teams.all().await.len(),
        players.all().await.len()
    );
}
