use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use wayfare_core::crm::{NewReferral, Referral, ReferralStatus};
use wayfare_core::repository::{BookingRepository, ClientRepository, ReferralRepository};
use wayfare_core::{CoreError, CoreResult};

/// Commission owed on `total_pence` at `rate_bps` basis points, rounded down to whole pence.
pub fn calculate_commission(total_pence: i64, rate_bps: i32) -> i64 {
    let product = i128::from(total_pence) * i128::from(rate_bps);
    (product.div_euclid(10_000)) as i64
}

/// Handles referral commissions from sign-up through payout
pub struct CommissionManager {
    clients: Arc<dyn ClientRepository>,
    bookings: Arc<dyn BookingRepository>,
    referrals: Arc<dyn ReferralRepository>,
}

impl CommissionManager {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        bookings: Arc<dyn BookingRepository>,
        referrals: Arc<dyn ReferralRepository>,
    ) -> Self {
        Self {
            clients,
            bookings,
            referrals,
        }
    }

    pub async fn create_referral(&self, input: NewReferral) -> CoreResult<Referral> {
        let referral = input.into_referral()?;

        for client_id in [referral.referrer_client_id, referral.referred_client_id] {
            self.clients
                .get_client(client_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Client", client_id))?;
        }

        self.referrals.create_referral(&referral).await?;
        info!(
            referral_id = %referral.id,
            rate_bps = referral.commission_rate_bps,
            "Referral recorded"
        );
        Ok(referral)
    }

    pub async fn get_referral(&self, id: Uuid) -> CoreResult<Referral> {
        self.referrals
            .get_referral(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Referral", id))
    }

    pub async fn list_referrals(&self) -> CoreResult<Vec<Referral>> {
        self.referrals.list_referrals().await
    }

    /// Transition: Pending → Earned once the referred client's booking exists
    pub async fn attach_booking(&self, referral_id: Uuid, booking_id: Uuid) -> CoreResult<Referral> {
        let mut referral = self.get_referral(referral_id).await?;
        if referral.status != ReferralStatus::Pending {
            return Err(invalid_transition(referral.status, ReferralStatus::Earned));
        }

        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking", booking_id))?;
        if booking.client_id != referral.referred_client_id {
            return Err(CoreError::validation(
                "booking does not belong to the referred client",
            ));
        }

        let commission = calculate_commission(booking.total_pence, referral.commission_rate_bps);
        referral.booking_id = Some(booking.id);
        referral.commission_pence = Some(commission);
        referral.status = ReferralStatus::Earned;
        referral.updated_at = Utc::now();
        self.referrals.update_referral(&referral).await?;

        info!(
            referral_id = %referral.id,
            booking_id = %booking.id,
            commission_pence = commission,
            "Referral commission earned"
        );
        Ok(referral)
    }

    /// Transition: Earned → Paid
    pub async fn mark_paid(&self, referral_id: Uuid) -> CoreResult<Referral> {
        let mut referral = self.get_referral(referral_id).await?;
        if referral.status != ReferralStatus::Earned {
            return Err(invalid_transition(referral.status, ReferralStatus::Paid));
        }

        referral.status = ReferralStatus::Paid;
        referral.updated_at = Utc::now();
        self.referrals.update_referral(&referral).await?;
        info!(referral_id = %referral.id, "Referral commission paid");
        Ok(referral)
    }
}

fn invalid_transition(from: ReferralStatus, to: ReferralStatus) -> CoreError {
    CoreError::Conflict(format!(
        "Invalid referral transition from {} to {}",
        from.as_str(),
        to.as_str()
    ))
}
