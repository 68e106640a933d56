// Wire DTOs for the scanner endpoints and the domain records built from them

use serde::{Deserialize, Deserializer, Serialize};

use crate::reservations::errors::ApiError;

pub type ReservationId = u64;

/// Contact details of the client who owns a reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One dish line of a reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub dish: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// A verified reservation, as displayed to the operator before serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub reservation_id: ReservationId,
    pub client: ClientInfo,
    /// Reservation status reported by the server (e.g. "En attente")
    pub status: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: f64,
}

/// Successful answer to a serve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeOutcome {
    pub reservation_id: ReservationId,
    pub message: Option<String>,
}

/// Body of `POST .../scanner/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    pub qr_data: &'a str,
}

/// Decimal amount that the server sends either as a JSON number or as a
/// decimal string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amount(pub f64);

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Amount(value)),
            Raw::Text(text) => text
                .trim()
                .parse::<f64>()
                .map(Amount)
                .map_err(|e| serde::de::Error::custom(format!("invalid amount {text:?}: {e}"))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireClient {
    #[serde(default)]
    pub nom: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tel: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireItem {
    pub plat: String,
    pub quantite: u32,
    pub prix: Amount,
}

/// Response envelope of the verify endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reservation_id: Option<ReservationId>,
    #[serde(default)]
    pub client: Option<WireClient>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<WireItem>,
    #[serde(default)]
    pub total: Option<Amount>,
}

impl VerifyResponse {
    /// Turn the envelope into a record, or into the rejection it carries.
    pub fn into_record(self) -> Result<ClientRecord, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected {
                message: self.message,
            });
        }

        let reservation_id = self.reservation_id.ok_or_else(|| ApiError::MalformedResponse {
            reason: "missing reservation_id".to_string(),
        })?;
        let client = self.client.ok_or_else(|| ApiError::MalformedResponse {
            reason: "missing client".to_string(),
        })?;

        let items: Vec<OrderItem> = self
            .items
            .into_iter()
            .map(|item| OrderItem {
                dish: item.plat,
                quantity: item.quantite,
                unit_price: item.prix.0,
            })
            .collect();

        let total = match self.total {
            Some(Amount(total)) => total,
            None => items.iter().map(OrderItem::line_total).sum(),
        };

        Ok(ClientRecord {
            reservation_id,
            client: ClientInfo {
                name: client.nom,
                email: client.email,
                phone: client.tel,
            },
            status: self.status,
            items,
            total,
        })
    }
}

/// Response envelope of the serve endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl ServeResponse {
    pub fn into_outcome(self, reservation_id: ReservationId) -> Result<ServeOutcome, ApiError> {
        if self.success {
            Ok(ServeOutcome {
                reservation_id,
                message: self.message,
            })
        } else {
            Err(ApiError::Rejected {
                message: self.message,
            })
        }
    }
}
