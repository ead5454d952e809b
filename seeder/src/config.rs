use schoolseed_config::load_config;
use schoolseed_config::shared::SeederConfig;

/// Loads and validates the seeder configuration.
///
/// Uses the layered configuration loader and validates the result before
/// handing it to the pipeline.
pub fn load_seeder_config() -> anyhow::Result<SeederConfig> {
    let config = load_config::<SeederConfig>()?;
    config.validate()?;

    Ok(config)
}
