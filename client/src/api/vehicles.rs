use super::client::{decode, decode_ack, ApiClient};
use super::types::{ApiError, CreateVehicleRequest, UpdateVehicleRequest, Vehicle};

impl ApiClient {
    pub async fn my_vehicles(&self) -> Result<Vec<Vehicle>, ApiError> {
        let response = self
            .send_with_refresh(|| self.http().get(format!("{}/vehicles/me", self.base_url())))
            .await?;
        decode(response, "VEHICLE").await
    }

    pub async fn create_vehicle(&self, request: CreateVehicleRequest) -> Result<Vehicle, ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .post(format!("{}/vehicles", self.base_url()))
                    .json(&request)
            })
            .await?;
        decode(response, "VEHICLE").await
    }

    pub async fn update_vehicle(
        &self,
        vehicle_id: &str,
        request: UpdateVehicleRequest,
    ) -> Result<Vehicle, ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .put(format!("{}/vehicles/{}", self.base_url(), vehicle_id))
                    .json(&request)
            })
            .await?;
        decode(response, "VEHICLE").await
    }

    pub async fn delete_vehicle(&self, vehicle_id: &str) -> Result<(), ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .delete(format!("{}/vehicles/{}", self.base_url(), vehicle_id))
            })
            .await?;
        decode_ack(response, "VEHICLE").await
    }
}
