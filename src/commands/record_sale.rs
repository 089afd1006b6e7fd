use crate::api::ApiClient;
use crate::args::RecordSaleArgs;
use crate::commands::Out;
use crate::model::NewSale;
use crate::Result;

/// Handles `eventory record-sale`. The date defaults to today according to the session clock.
pub async fn record_sale(client: &ApiClient, args: &RecordSaleArgs) -> Result<Out<NewSale>> {
    let sale = NewSale {
        item_id: args.item_id().trim().to_string(),
        quantity: args.quantity(),
        date: args
            .date()
            .unwrap_or_else(|| client.session().clock().today()),
        sale_type: args.sale_type(),
        customer_name: args.customer_name().trim().to_string(),
    };
    let reply = client.record_sale(&sale).await?;
    let message = reply.unwrap_or_else(|| "Sale recorded".to_string());
    Ok(Out::new(
        format!(
            "{message}: {} x {} on {}",
            sale.quantity, sale.item_id, sale.date
        ),
        sale,
    ))
}
