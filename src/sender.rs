//! Source-side proposal sender.
//!
//! Builds an envelope per destination, pays the relay fee to the gas
//! collector, and hands the encoded envelope to the transport. The sender
//! holds no balance of its own: every attached unit of native value is either
//! forwarded to the gas collector or rejected up front.

use std::sync::Arc;

use tracing::info;

use crate::codec;
use crate::error::SenderError;
use crate::transport::{GasService, Transport};
use crate::types::{Address, Call, CrossChainDispatch, Envelope, InvocationContext};

pub struct ProposalSender {
    transport: Arc<dyn Transport>,
    gas_service: Arc<dyn GasService>,
}

impl ProposalSender {
    /// Creates a sender bound to a transport and a gas collector. Both
    /// collaborators must report a non-zero address.
    pub fn new(
        transport: Arc<dyn Transport>,
        gas_service: Arc<dyn GasService>,
    ) -> Result<Self, SenderError> {
        if transport.address().is_zero() || gas_service.address().is_zero() {
            return Err(SenderError::InvalidAddress);
        }
        Ok(Self {
            transport,
            gas_service,
        })
    }

    /// Relays one proposal to one destination chain. The whole attached value
    /// is forwarded to the gas collector as the relay fee; a zero fee skips
    /// the gas collector entirely but still dispatches.
    pub fn send_proposal(
        &self,
        ctx: &InvocationContext,
        destination_chain: &str,
        destination_contract: Address,
        calls: Vec<Call>,
    ) -> Result<(), SenderError> {
        self.dispatch_one(
            ctx.caller,
            destination_chain,
            destination_contract,
            calls,
            ctx.value,
        )
    }

    /// Relays proposals to multiple destination chains in one invocation.
    /// The attached value must equal the exact sum of the per-dispatch gas
    /// budgets; any mismatch aborts before the first dispatch goes out.
    pub fn send_proposals(
        &self,
        ctx: &InvocationContext,
        dispatches: Vec<CrossChainDispatch>,
    ) -> Result<(), SenderError> {
        let mut required: u128 = 0;
        for dispatch in &dispatches {
            required = required
                .checked_add(dispatch.gas)
                .ok_or(SenderError::InvalidFee {
                    attached: ctx.value,
                    required: u128::MAX,
                })?;
        }
        if required != ctx.value {
            return Err(SenderError::InvalidFee {
                attached: ctx.value,
                required,
            });
        }

        for dispatch in dispatches {
            self.dispatch_one(
                ctx.caller,
                &dispatch.destination_chain,
                dispatch.destination_contract,
                dispatch.calls,
                dispatch.gas,
            )?;
        }
        Ok(())
    }

    fn dispatch_one(
        &self,
        caller: Address,
        destination_chain: &str,
        destination_contract: Address,
        calls: Vec<Call>,
        fee: u128,
    ) -> Result<(), SenderError> {
        let envelope = Envelope { caller, calls };
        let payload = codec::encode_envelope(&envelope);
        let payload_hash = codec::payload_hash(&payload);

        if fee > 0 {
            self.gas_service.pay_gas(
                caller,
                destination_chain,
                destination_contract,
                payload_hash,
                fee,
            )?;
        }

        info!(
            destination_chain,
            destination_contract = %destination_contract,
            caller = %caller,
            calls = envelope.calls.len(),
            fee,
            "dispatching proposal"
        );
        self.transport
            .dispatch(destination_chain, destination_contract, payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GasPaymentError, TransportError};
    use std::sync::Mutex;

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address(bytes)
    }

    #[derive(Default)]
    struct RecordingTransport {
        addr: Address,
        dispatched: Mutex<Vec<(String, Address, Vec<u8>)>>,
    }

    impl Transport for RecordingTransport {
        fn address(&self) -> Address {
            self.addr
        }

        fn dispatch(
            &self,
            destination_chain: &str,
            destination_contract: Address,
            payload: Vec<u8>,
        ) -> Result<(), TransportError> {
            self.dispatched.lock().unwrap().push((
                destination_chain.to_string(),
                destination_contract,
                payload,
            ));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingGasService {
        addr: Address,
        payments: Mutex<Vec<(Address, String, Address, [u8; 32], u128)>>,
    }

    impl GasService for RecordingGasService {
        fn address(&self) -> Address {
            self.addr
        }

        fn pay_gas(
            &self,
            payer: Address,
            destination_chain: &str,
            destination_contract: Address,
            payload_hash: [u8; 32],
            amount: u128,
        ) -> Result<(), GasPaymentError> {
            self.payments.lock().unwrap().push((
                payer,
                destination_chain.to_string(),
                destination_contract,
                payload_hash,
                amount,
            ));
            Ok(())
        }
    }

    fn fixture() -> (
        ProposalSender,
        Arc<RecordingTransport>,
        Arc<RecordingGasService>,
    ) {
        let transport = Arc::new(RecordingTransport {
            addr: addr(10),
            ..Default::default()
        });
        let gas = Arc::new(RecordingGasService {
            addr: addr(11),
            ..Default::default()
        });
        let sender = ProposalSender::new(transport.clone(), gas.clone()).unwrap();
        (sender, transport, gas)
    }

    fn sample_calls() -> Vec<Call> {
        vec![Call {
            target: addr(3),
            value: 0,
            call_data: b"set".to_vec(),
        }]
    }

    #[test]
    fn test_new_rejects_zero_addresses() {
        let transport = Arc::new(RecordingTransport::default());
        let gas = Arc::new(RecordingGasService {
            addr: addr(11),
            ..Default::default()
        });
        assert!(matches!(
            ProposalSender::new(transport, gas),
            Err(SenderError::InvalidAddress)
        ));
    }

    #[test]
    fn test_send_proposal_pays_gas_and_dispatches() {
        let (sender, transport, gas) = fixture();
        let ctx = InvocationContext::new(addr(1), 5);

        sender
            .send_proposal(&ctx, "avalanche", addr(2), sample_calls())
            .unwrap();

        let expected_payload = codec::encode_envelope(&Envelope {
            caller: addr(1),
            calls: sample_calls(),
        });
        let payments = gas.payments.lock().unwrap();
        assert_eq!(
            payments[..],
            [(
                addr(1),
                "avalanche".to_string(),
                addr(2),
                codec::payload_hash(&expected_payload),
                5
            )]
        );

        let dispatched = transport.dispatched.lock().unwrap();
        assert_eq!(
            dispatched[..],
            [("avalanche".to_string(), addr(2), expected_payload)]
        );
    }

    #[test]
    fn test_zero_value_skips_gas_service() {
        let (sender, transport, gas) = fixture();
        let ctx = InvocationContext::from_caller(addr(1));

        sender
            .send_proposal(&ctx, "avalanche", addr(2), sample_calls())
            .unwrap();

        assert!(gas.payments.lock().unwrap().is_empty());
        assert_eq!(transport.dispatched.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_send_proposals_fee_mismatch_sends_nothing() {
        let (sender, transport, gas) = fixture();
        let dispatches = vec![
            CrossChainDispatch {
                destination_chain: "avalanche".to_string(),
                destination_contract: addr(2),
                gas: 1,
                calls: sample_calls(),
            },
            CrossChainDispatch {
                destination_chain: "binance".to_string(),
                destination_contract: addr(2),
                gas: 2,
                calls: sample_calls(),
            },
        ];

        // Underpayment
        let err = sender
            .send_proposals(&InvocationContext::new(addr(1), 2), dispatches.clone())
            .unwrap_err();
        assert!(matches!(
            err,
            SenderError::InvalidFee {
                attached: 2,
                required: 3
            }
        ));

        // Overpayment
        let err = sender
            .send_proposals(&InvocationContext::new(addr(1), 4), dispatches)
            .unwrap_err();
        assert!(matches!(
            err,
            SenderError::InvalidFee {
                attached: 4,
                required: 3
            }
        ));

        assert!(gas.payments.lock().unwrap().is_empty());
        assert!(transport.dispatched.lock().unwrap().is_empty());
    }

    #[test]
    fn test_send_proposals_fans_out_per_dispatch_fee() {
        let (sender, transport, gas) = fixture();
        let dispatches = vec![
            CrossChainDispatch {
                destination_chain: "avalanche".to_string(),
                destination_contract: addr(2),
                gas: 1,
                calls: sample_calls(),
            },
            CrossChainDispatch {
                destination_chain: "binance".to_string(),
                destination_contract: addr(4),
                gas: 0,
                calls: sample_calls(),
            },
        ];

        sender
            .send_proposals(&InvocationContext::new(addr(1), 1), dispatches)
            .unwrap();

        // Only the first dispatch carried a fee
        let payments = gas.payments.lock().unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].1, "avalanche");
        assert_eq!(payments[0].4, 1);

        let dispatched = transport.dispatched.lock().unwrap();
        assert_eq!(dispatched.len(), 2);
        assert_eq!(dispatched[0].0, "avalanche");
        assert_eq!(dispatched[1].0, "binance");
    }
}
