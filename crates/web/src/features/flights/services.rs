use storage::{
    error::Result,
    models::{FlightData, FlightRecord},
    repository::ChampionshipStore,
};
use uuid::Uuid;

/// Record a new flight; its total is computed here and stored with it
pub async fn add_flight(
    store: &dyn ChampionshipStore,
    championship_id: Uuid,
    data: FlightData,
) -> Result<FlightRecord> {
    let mut championship = store.find_by_id(championship_id).await?;
    let flight = championship.add_flight(data).clone();

    tracing::debug!(
        "Flight {} by {} scored {}",
        flight.id,
        flight.data.falconer_name,
        flight.total_points()
    );

    store.upsert(&championship).await?;
    Ok(flight)
}

/// Replace a flight's measurements and rescore it
pub async fn update_flight(
    store: &dyn ChampionshipStore,
    championship_id: Uuid,
    flight_id: Uuid,
    data: FlightData,
) -> Result<FlightRecord> {
    let mut championship = store.find_by_id(championship_id).await?;
    let flight = championship.update_flight(flight_id, data)?.clone();

    store.upsert(&championship).await?;
    Ok(flight)
}

pub async fn delete_flight(
    store: &dyn ChampionshipStore,
    championship_id: Uuid,
    flight_id: Uuid,
) -> Result<()> {
    let mut championship = store.find_by_id(championship_id).await?;
    championship.remove_flight(flight_id)?;

    store.upsert(&championship).await?;
    Ok(())
}
