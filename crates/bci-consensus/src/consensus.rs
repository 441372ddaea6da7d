//! Consensus parameters and the process-wide selected-network handle.

pub mod params;

pub use params::{
    select_params, selected_params, update_deployment_params, Deployment, DeploymentParams,
    NetworkParams,
};
