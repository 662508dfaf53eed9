use std::sync::Arc;

use super::adapters::portable::SystemEffector;
use super::adapters::SharedEffector;

pub fn default_effector() -> SharedEffector {
    Arc::new(SystemEffector::new())
}
