use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use voicecart_core::config::PaymentsConfig;
use voicecart_core::domain::payment::{
    ActionProvidedPaymentOptions, CardNetwork, GoogleProvidedPaymentOptions, PaymentOptions,
    PaymentPath, PaymentType, TokenizationParameters, TokenizationType,
};

const SUPPORTED_CARD_NETWORKS: [CardNetwork; 4] =
    [CardNetwork::Visa, CardNetwork::Amex, CardNetwork::Discover, CardNetwork::Mastercard];

/// Payment options offered on each path, built from configuration.
#[derive(Clone, Debug)]
pub struct PaymentSettings {
    gateway: String,
    sdk_version: String,
    api_version: String,
    merchant_id: String,
    client_key: SecretString,
    authorization_fingerprint: SecretString,
    card_display_name: String,
}

impl From<&PaymentsConfig> for PaymentSettings {
    fn from(config: &PaymentsConfig) -> Self {
        Self {
            gateway: config.gateway.clone(),
            sdk_version: config.sdk_version.clone(),
            api_version: config.api_version.clone(),
            merchant_id: config.merchant_id.clone(),
            client_key: config.client_key.clone(),
            authorization_fingerprint: config.authorization_fingerprint.clone(),
            card_display_name: config.card_display_name.clone(),
        }
    }
}

impl PaymentSettings {
    pub fn options_for(&self, path: PaymentPath) -> PaymentOptions {
        match path {
            PaymentPath::Merchant => self.action_provided(),
            PaymentPath::GooglePay => self.google_provided(),
        }
    }

    pub fn action_provided(&self) -> PaymentOptions {
        PaymentOptions::ActionProvidedOptions(ActionProvidedPaymentOptions {
            payment_type: PaymentType::PaymentCard,
            display_name: self.card_display_name.clone(),
        })
    }

    /// Gateway tokenization parameters, keys prefixed with the gateway name.
    pub fn google_provided(&self) -> PaymentOptions {
        let prefixed = |key: &str| format!("{}:{key}", self.gateway);
        let parameters = BTreeMap::from([
            ("gateway".to_owned(), self.gateway.clone()),
            (prefixed("sdkVersion"), self.sdk_version.clone()),
            (prefixed("apiVersion"), self.api_version.clone()),
            (prefixed("merchantId"), self.merchant_id.clone()),
            (prefixed("clientKey"), self.client_key.expose_secret().to_owned()),
            (
                prefixed("authorizationFingerprint"),
                self.authorization_fingerprint.expose_secret().to_owned(),
            ),
        ]);

        PaymentOptions::GoogleProvidedOptions(GoogleProvidedPaymentOptions {
            prepaid_card_disallowed: false,
            supported_card_networks: SUPPORTED_CARD_NETWORKS.to_vec(),
            tokenization_parameters: TokenizationParameters {
                parameters,
                tokenization_type: TokenizationType::PaymentGateway,
            },
        })
    }
}
