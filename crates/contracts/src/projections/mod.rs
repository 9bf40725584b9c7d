pub mod p001_car_search;
