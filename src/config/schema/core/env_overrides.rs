use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("CHROMATICA_PROMPT_MODEL")
            && !model.is_empty()
        {
            self.orchestrator.prompt_model = model;
        }

        if let Ok(model) = std::env::var("CHROMATICA_IMAGE_MODEL")
            && !model.is_empty()
        {
            self.orchestrator.image_model = model;
        }

        if let Ok(seed_str) = std::env::var("CHROMATICA_RNG_SEED")
            && let Ok(seed) = seed_str.parse::<u64>()
        {
            self.evolution.rng_seed = Some(seed);
        }

        if let Ok(capacity_str) = std::env::var("CHROMATICA_HISTORY_CAPACITY")
            && let Ok(capacity) = capacity_str.parse::<usize>()
            && capacity > 0
        {
            self.evolution.history_capacity = capacity;
        }
    }
}
