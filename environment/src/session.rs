use anyhow::Result;
use log::{error, info};

use super::Environment;

/// Sole owner of an environment for the duration of an evaluation.
///
/// The environment is terminated exactly once: explicitly through [`EnvironmentSession::terminate`],
/// or on drop if the session is abandoned on an error path.
pub struct EnvironmentSession<E: Environment> {
    env: E,
    terminated: bool,
}

impl<E: Environment> EnvironmentSession<E> {
    pub fn new(env: E) -> Self {
        Self {
            env,
            terminated: false,
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn terminate(mut self) -> Result<()> {
        self.terminated = true;
        info!("Terminating environment");
        self.env.terminate()
    }
}

impl<E: Environment> Drop for EnvironmentSession<E> {
    fn drop(&mut self) {
        if self.terminated {
            return;
        }

        self.terminated = true;
        if let Err(err) = self.env.terminate() {
            error!("Failed to terminate environment: {:?}", err);
        }
    }
}
