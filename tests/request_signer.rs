// crates.io
use time::OffsetDateTime;
// self
use xbl_auth::signing::{RequestSigner, SignatureBlob, from_filetime, to_filetime};

const TEST_SIGNING_KEY: &str = include_str!("data/test_signing_key.pem");
const TIMESTAMP: i64 = 1_586_999_965;
const METHOD: &str = "POST";
const PATH_AND_QUERY: &str = "/path?query=1";
const BODY: &[u8] = b"thebodygoeshere";
const AUTHORIZATION: &str = "XBL3.0 x=userid;jsonwebtoken";

fn signer() -> RequestSigner {
	RequestSigner::from_pem(TEST_SIGNING_KEY).expect("Test signing key should load.")
}

fn timestamp() -> OffsetDateTime {
	OffsetDateTime::from_unix_timestamp(TIMESTAMP).expect("Fixture timestamp should be valid.")
}

#[test]
fn proof_key_matches_known_coordinates() {
	let proof = signer().proof_field();

	assert_eq!(proof.kty, "EC");
	assert_eq!(proof.crv, "P-256");
	assert_eq!(proof.alg, "ES256");
	assert_eq!(proof.use_, "sig");
	assert_eq!(proof.x, "b3MnMiM3BmREetVUNrCWdQI3CL29PPooAPx71C9ACYQ");
	assert_eq!(proof.y, "P7dOEKB9efrQo24NcWjOymTIRtNaV0hp_uxwNFhgDKg");
}

#[test]
fn filetime_of_known_instant() {
	let filetime = to_filetime(timestamp());

	assert_eq!(filetime, 132_314_735_650_000_000);
	assert_eq!(from_filetime(filetime).expect("FILETIME should convert back."), timestamp());
}

#[test]
fn digest_of_known_request() {
	let digest = signer().hash(METHOD, PATH_AND_QUERY, BODY, AUTHORIZATION, to_filetime(timestamp()));
	let hex = digest.iter().map(|byte| format!("{byte:02x}")).collect::<String>();

	assert_eq!(hex, "f7d61b6f8d4dcd86da1aa8553f0ee7c15450811e7cd2759364e22f67d853ff50");
}

#[test]
fn signature_of_known_request() {
	let signer = signer();
	let header = signer
		.sign(METHOD, PATH_AND_QUERY, BODY, AUTHORIZATION, Some(timestamp()))
		.expect("Signing should succeed.");

	assert_eq!(
		header,
		"AAAAAQHWE40Q98yAEsc7i0Iuu8VhiUDWw/h2P6ju863GSziQ3BhjvNwH/XV5tJuJqnA5OOMjCvocPQ3Dm5UqV+FKl9ReBKoj7Ut7Vw=="
	);

	let blob = SignatureBlob::decode(&header).expect("Golden header should decode.");

	assert_eq!(blob.version, 1);
	assert_eq!(blob.filetime, 132_314_735_650_000_000);
	assert!(
		signer
			.verify_header(&header, METHOD, PATH_AND_QUERY, BODY, AUTHORIZATION)
			.expect("Verification should run.")
	);
	assert!(
		!signer
			.verify_header(&header, METHOD, PATH_AND_QUERY, b"tampered", AUTHORIZATION)
			.expect("Verification should run.")
	);
}
