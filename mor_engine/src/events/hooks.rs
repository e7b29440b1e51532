use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PayoutCreatedEvent, WithdrawalRequestedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payout_created_producer: Vec<EventProducer<PayoutCreatedEvent>>,
    pub withdrawal_requested_producer: Vec<EventProducer<WithdrawalRequestedEvent>>,
}

impl EventProducers {
    pub async fn payout_created(&self, event: PayoutCreatedEvent) {
        for producer in &self.payout_created_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn withdrawal_requested(&self, event: WithdrawalRequestedEvent) {
        for producer in &self.withdrawal_requested_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_payout_created: Option<EventHandler<PayoutCreatedEvent>>,
    pub on_withdrawal_requested: Option<EventHandler<WithdrawalRequestedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payout_created = hooks.on_payout_created.map(|f| EventHandler::new(buffer_size, f));
        let on_withdrawal_requested = hooks.on_withdrawal_requested.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payout_created, on_withdrawal_requested }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payout_created {
            result.payout_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_withdrawal_requested {
            result.withdrawal_requested_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payout_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_withdrawal_requested {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payout_created: Option<Handler<PayoutCreatedEvent>>,
    pub on_withdrawal_requested: Option<Handler<WithdrawalRequestedEvent>>,
}

impl EventHooks {
    pub fn on_payout_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PayoutCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payout_created = Some(Arc::new(f));
        self
    }

    pub fn on_withdrawal_requested<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WithdrawalRequestedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_withdrawal_requested = Some(Arc::new(f));
        self
    }
}
