//! Procedural macros for end-to-end tests.
use proc_macro::TokenStream;

mod test;

/// Defines an end-to-end test that runs against its own ephemeral chain and
/// injects one prefunded account per argument, in declaration order.
///
/// # Examples
///
/// ```rust,ignore
/// #[e2e::test]
/// async fn deploys_origin_pool(alice: Account) -> eyre::Result<()> {
///     let factory = ContractFactory::load("artifacts", "OriginPool")?;
///     let deployment = alice.as_deployer().deploy(&factory).await?;
///     assert_eq!(deployment.deployer, alice.address());
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, input: TokenStream) -> TokenStream {
    test::test(attr, input)
}
