//! Automatic first selection on entering a frame

use hfw_core::prelude::*;

use super::{run_cancellable, CancelToken};
use crate::services::{MessageBroker, QParamService};

pub struct AutomaticFirstSelectionHandler<'a, Q, B> {
    qparams: &'a Q,
    broker: &'a B,
    token: CancelToken,
}

impl<'a, Q, B> AutomaticFirstSelectionHandler<'a, Q, B>
where
    Q: QParamService + Sync,
    B: MessageBroker + Sync,
{
    pub fn new(qparams: &'a Q, broker: &'a B, token: CancelToken) -> Self {
        Self {
            qparams,
            broker,
            token,
        }
    }

    /// Ask the frame's q-param service for a selection and route it.
    ///
    /// Resolves `false` when the frame has no service or nothing to select.
    pub async fn run(self, frame_id: &str, q_param_service: Option<&str>) -> Result<bool> {
        let Some(service_id) = q_param_service else {
            trace!("Frame {} has no q-param service", frame_id);
            return Ok(false);
        };

        let selection = run_cancellable(
            "first selection",
            &self.token,
            self.qparams.first_selection(service_id, frame_id),
        )
        .await?;

        let Some(message) = selection else {
            debug!("No first selection for frame {}", frame_id);
            return Ok(false);
        };

        run_cancellable(
            "first selection message",
            &self.token,
            self.broker.send_message_from_qparam_service(frame_id, &message),
        )
        .await
    }
}
