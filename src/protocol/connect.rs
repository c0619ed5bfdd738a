//! MCS Connect-Initial and Connect-Response PDUs (T.125 section 7, part 1)

use bytes::{BufMut, Bytes};

use super::{
    DomainParameters, Error, MCS_TYPE_CONNECT_INITIAL, MCS_TYPE_CONNECT_RESPONSE, Result, ber,
};

/// Domain selector used by RDP clients for both calling and called domains
pub const DOMAIN_SELECTOR: &[u8] = &[0x01];

/// Connect-Initial sent by the client to open the domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInitial {
    calling_domain_selector: Bytes,
    called_domain_selector: Bytes,
    upward_flag: bool,
    target_parameters: DomainParameters,
    minimum_parameters: DomainParameters,
    maximum_parameters: DomainParameters,
    user_data: Bytes,
}

impl ConnectInitial {
    /// Build the client Connect-Initial around a GCC conference create request
    pub fn new(user_data: impl Into<Bytes>) -> Self {
        Self::with_parameters(
            DomainParameters::client_target(),
            DomainParameters::client_minimum(),
            DomainParameters::client_maximum(),
            user_data,
        )
    }

    /// Build a Connect-Initial with custom parameter triples
    ///
    /// The fields RDP fixes (priorities, throughput, height, version) are
    /// pinned before encoding.
    pub fn with_parameters(
        target: DomainParameters,
        minimum: DomainParameters,
        maximum: DomainParameters,
        user_data: impl Into<Bytes>,
    ) -> Self {
        Self {
            calling_domain_selector: Bytes::from_static(DOMAIN_SELECTOR),
            called_domain_selector: Bytes::from_static(DOMAIN_SELECTOR),
            upward_flag: true,
            target_parameters: target.pinned(),
            minimum_parameters: minimum.pinned(),
            maximum_parameters: maximum.pinned(),
            user_data: user_data.into(),
        }
    }

    /// Calling domain selector
    #[must_use]
    pub fn calling_domain_selector(&self) -> &Bytes {
        &self.calling_domain_selector
    }

    /// Called domain selector
    #[must_use]
    pub fn called_domain_selector(&self) -> &Bytes {
        &self.called_domain_selector
    }

    /// Upward flag
    #[must_use]
    pub const fn upward_flag(&self) -> bool {
        self.upward_flag
    }

    /// Target, minimum and maximum parameters
    #[must_use]
    pub const fn parameters(&self) -> [DomainParameters; 3] {
        [
            self.target_parameters,
            self.minimum_parameters,
            self.maximum_parameters,
        ]
    }

    /// Opaque user data (GCC conference create request)
    #[must_use]
    pub fn user_data(&self) -> &Bytes {
        &self.user_data
    }

    /// Encode the body without the application tag
    #[must_use]
    pub fn encode_body(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(128 + self.user_data.len());
        ber::write_octet_string(&self.calling_domain_selector, &mut body);
        ber::write_octet_string(&self.called_domain_selector, &mut body);
        ber::write_boolean(self.upward_flag, &mut body);
        self.target_parameters.encode(&mut body);
        self.minimum_parameters.encode(&mut body);
        self.maximum_parameters.encode(&mut body);
        ber::write_octet_string(&self.user_data, &mut body);
        body
    }

    /// Encode with the Connect-Initial application tag
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let body = self.encode_body();
        let mut out = Vec::with_capacity(body.len() + 6);
        ber::write_application_tag(MCS_TYPE_CONNECT_INITIAL, body.len(), &mut out);
        out.put_slice(&body);
        out
    }

    /// Decode a tagged Connect-Initial
    pub fn decode(mut bytes: Bytes) -> Result<Self> {
        let len = ber::read_application_tag(&mut bytes, MCS_TYPE_CONNECT_INITIAL)?;
        let mut body = take_body(&mut bytes, len)?;
        Ok(Self {
            calling_domain_selector: ber::read_octet_string(&mut body)?,
            called_domain_selector: ber::read_octet_string(&mut body)?,
            upward_flag: ber::read_boolean(&mut body)?,
            target_parameters: DomainParameters::decode(&mut body)?,
            minimum_parameters: DomainParameters::decode(&mut body)?,
            maximum_parameters: DomainParameters::decode(&mut body)?,
            user_data: ber::read_octet_string(&mut body)?,
        })
    }
}

/// Connect-Response returned by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectResponse {
    result: u8,
    called_connect_id: u32,
    domain_parameters: DomainParameters,
    user_data: Bytes,
}

impl ConnectResponse {
    /// Result code signalling success
    pub const RESULT_SUCCESSFUL: u8 = 0;

    /// Create a response
    pub fn new(
        result: u8,
        called_connect_id: u32,
        domain_parameters: DomainParameters,
        user_data: impl Into<Bytes>,
    ) -> Self {
        Self {
            result,
            called_connect_id,
            domain_parameters,
            user_data: user_data.into(),
        }
    }

    /// Result code (`rt-successful` is 0)
    #[must_use]
    pub const fn result(&self) -> u8 {
        self.result
    }

    /// Called connect id
    #[must_use]
    pub const fn called_connect_id(&self) -> u32 {
        self.called_connect_id
    }

    /// Parameters chosen by the server
    #[must_use]
    pub const fn domain_parameters(&self) -> DomainParameters {
        self.domain_parameters
    }

    /// Opaque user data (GCC conference create response)
    #[must_use]
    pub fn user_data(&self) -> &Bytes {
        &self.user_data
    }

    /// Encode with the Connect-Response application tag
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(64 + self.user_data.len());
        ber::write_enumerated(self.result, &mut body);
        ber::write_integer(self.called_connect_id, &mut body);
        self.domain_parameters.encode(&mut body);
        ber::write_octet_string(&self.user_data, &mut body);

        let mut out = Vec::with_capacity(body.len() + 6);
        ber::write_application_tag(MCS_TYPE_CONNECT_RESPONSE, body.len(), &mut out);
        out.put_slice(&body);
        out
    }

    /// Decode a tagged Connect-Response
    pub fn decode(mut bytes: Bytes) -> Result<Self> {
        let len = ber::read_application_tag(&mut bytes, MCS_TYPE_CONNECT_RESPONSE)?;
        let mut body = take_body(&mut bytes, len)?;
        Ok(Self {
            result: ber::read_enumerated(&mut body)?,
            called_connect_id: ber::read_integer(&mut body)?,
            domain_parameters: DomainParameters::decode(&mut body)?,
            user_data: ber::read_octet_string(&mut body)?,
        })
    }
}

fn take_body(bytes: &mut Bytes, len: usize) -> Result<Bytes> {
    if bytes.len() < len {
        return Err(Error::InvalidLength {
            context: "mcs connect pdu",
            len,
        });
    }
    Ok(bytes.split_to(len))
}
